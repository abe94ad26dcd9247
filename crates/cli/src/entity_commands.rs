use {
    anyhow::{Context, bail},
    clap::{Subcommand, ValueEnum},
    givers_config::GiversConfig,
    givers_persistence::{
        EntityId, Gateway, Lookup,
        entities::{Donation, Frequency, Report, Role, Urgency, UserProfile},
    },
    givers_toast::{ToastOptions, ToastService},
};

use crate::db_commands::open_gateway;

#[derive(Subcommand)]
pub enum DonationAction {
    /// List every recorded donation.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Show one donation.
    Get { id: EntityId },
    /// Record a donation.
    Add {
        /// Donor name as it should appear on receipts.
        donor: String,
        /// Amount in currency units, e.g. `25` or `19.99`.
        amount: String,
        /// Campaign the donation is earmarked for.
        #[arg(long = "type", default_value = "General")]
        donation_type: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, value_enum, default_value_t = FrequencyArg::OneTime)]
        frequency: FrequencyArg,
        #[arg(long)]
        message: Option<String>,
    },
    /// Delete a donation.
    Remove { id: EntityId },
}

#[derive(Subcommand)]
pub enum ReportAction {
    /// List every filed report.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// File an incident report.
    Add {
        reporter: String,
        email: String,
        /// Kind of incident, e.g. "Flood".
        #[arg(long = "type")]
        report_type: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long, value_enum, default_value_t = UrgencyArg::Medium)]
        urgency: UrgencyArg,
    },
    /// Delete a report.
    Remove { id: EntityId },
}

#[derive(Subcommand)]
pub enum UserAction {
    /// List registered users.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Register a user.
    Add {
        first_name: String,
        last_name: String,
        email: String,
        #[arg(long, value_enum, default_value_t = RoleArg::Donor)]
        role: RoleArg,
    },
    /// Delete a user.
    Remove { id: EntityId },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FrequencyArg {
    OneTime,
    Monthly,
    Quarterly,
    Annually,
}

impl From<FrequencyArg> for Frequency {
    fn from(value: FrequencyArg) -> Self {
        match value {
            FrequencyArg::OneTime => Self::OneTime,
            FrequencyArg::Monthly => Self::Monthly,
            FrequencyArg::Quarterly => Self::Quarterly,
            FrequencyArg::Annually => Self::Annually,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum UrgencyArg {
    Low,
    Medium,
    High,
    Critical,
}

impl From<UrgencyArg> for Urgency {
    fn from(value: UrgencyArg) -> Self {
        match value {
            UrgencyArg::Low => Self::Low,
            UrgencyArg::Medium => Self::Medium,
            UrgencyArg::High => Self::High,
            UrgencyArg::Critical => Self::Critical,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Donor,
    Volunteer,
    Reporter,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Donor => Self::Donor,
            RoleArg::Volunteer => Self::Volunteer,
            RoleArg::Reporter => Self::Reporter,
            RoleArg::Admin => Self::Admin,
        }
    }
}

/// Parse a decimal amount such as `"19.99"` into cents.
pub fn parse_amount_cents(input: &str) -> anyhow::Result<i64> {
    let input = input.trim();
    let (whole, frac) = match input.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (input, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        bail!("amount is empty");
    }
    if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
        bail!("amount `{input}` must have at most two decimal places");
    }
    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .with_context(|| format!("amount `{input}` is not a number"))?
    };
    if whole < 0 {
        bail!("amount must be positive");
    }
    let frac: i64 = format!("{frac:0<2}").parse().unwrap_or(0);
    let cents = whole
        .checked_mul(100)
        .and_then(|c| c.checked_add(frac))
        .context("amount is too large")?;
    if cents == 0 {
        bail!("amount must be positive");
    }
    Ok(cents)
}

pub async fn handle_donations(
    action: DonationAction,
    config: &GiversConfig,
    toasts: &ToastService,
) -> anyhow::Result<()> {
    let gateway = open_gateway(&config.database).await?;
    match action {
        DonationAction::List { json } => {
            let donations = gateway.get_all::<Donation>().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&donations)?);
            } else if donations.is_empty() {
                println!("No donations recorded.");
            } else {
                for d in &donations {
                    println!(
                        "{:>5}  {:>10}  {:<20}  {}",
                        d.id.unwrap_or_default(),
                        d.amount_display(),
                        d.donation_type,
                        d.donor_name
                    );
                }
            }
            Ok(())
        },
        DonationAction::Get { id } => {
            let donation = get_donation(&gateway, toasts, id).await?;
            if let Some(donation) = donation {
                println!("{}", serde_json::to_string_pretty(&donation)?);
            }
            Ok(())
        },
        DonationAction::Add {
            donor,
            amount,
            donation_type,
            email,
            frequency,
            message,
        } => {
            let mut donation = Donation::new(donor, parse_amount_cents(&amount)?, donation_type);
            donation.email = email;
            donation.frequency = frequency.into();
            donation.message = message;
            add_donation(&gateway, toasts, donation).await?;
            Ok(())
        },
        DonationAction::Remove { id } => remove::<Donation>(&gateway, toasts, id, "Donation").await,
    }
}

pub async fn handle_reports(
    action: ReportAction,
    config: &GiversConfig,
    toasts: &ToastService,
) -> anyhow::Result<()> {
    let gateway = open_gateway(&config.database).await?;
    match action {
        ReportAction::List { json } => {
            let reports = gateway.get_all::<Report>().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else if reports.is_empty() {
                println!("No reports filed.");
            } else {
                for r in &reports {
                    println!(
                        "{:>5}  {:<9}  {:<12}  {:<20}  {}",
                        r.id.unwrap_or_default(),
                        format!("{:?}", r.urgency).to_lowercase(),
                        r.report_type,
                        r.location,
                        r.reporter_name
                    );
                }
            }
            Ok(())
        },
        ReportAction::Add {
            reporter,
            email,
            report_type,
            location,
            description,
            phone,
            urgency,
        } => {
            let mut report = Report::new(reporter, email, report_type, location, description);
            report.phone = phone;
            report.urgency = urgency.into();
            add_report(&gateway, toasts, report).await?;
            Ok(())
        },
        ReportAction::Remove { id } => remove::<Report>(&gateway, toasts, id, "Report").await,
    }
}

pub async fn handle_users(
    action: UserAction,
    config: &GiversConfig,
    toasts: &ToastService,
) -> anyhow::Result<()> {
    let gateway = open_gateway(&config.database).await?;
    match action {
        UserAction::List { json } => {
            let users = gateway.get_all::<UserProfile>().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else if users.is_empty() {
                println!("No users registered.");
            } else {
                for u in &users {
                    println!(
                        "{:>5}  {:<9}  {:<24}  {}",
                        u.id.unwrap_or_default(),
                        format!("{:?}", u.role).to_lowercase(),
                        u.full_name(),
                        u.email
                    );
                }
            }
            Ok(())
        },
        UserAction::Add {
            first_name,
            last_name,
            email,
            role,
        } => {
            let user = UserProfile::new(first_name, last_name, email, role.into());
            add_user(&gateway, toasts, user).await?;
            Ok(())
        },
        UserAction::Remove { id } => remove::<UserProfile>(&gateway, toasts, id, "User").await,
    }
}

async fn get_donation(
    gateway: &Gateway,
    toasts: &ToastService,
    id: EntityId,
) -> anyhow::Result<Option<Donation>> {
    match gateway.lookup::<Donation>(id).await {
        Lookup::Found(donation) => Ok(Some(donation)),
        Lookup::NotFound => {
            toasts.show_warning(
                ToastOptions::title("Not found").with_description(format!("No donation #{id}")),
            );
            Ok(None)
        },
        Lookup::StoreError(e) => {
            toasts.show_error(
                ToastOptions::title("Lookup failed").with_description(e.to_string()),
            );
            Err(e.into())
        },
    }
}

async fn add_donation(
    gateway: &Gateway,
    toasts: &ToastService,
    donation: Donation,
) -> anyhow::Result<Donation> {
    match gateway.create(donation).await {
        Ok(saved) => {
            toasts.show_success(ToastOptions::title("Thank you!").with_description(format!(
                "Donation #{} of {} from {} recorded",
                saved.id.unwrap_or_default(),
                saved.amount_display(),
                saved.donor_name
            )));
            Ok(saved)
        },
        Err(e) => {
            toasts.show_error(
                ToastOptions::title("Donation not saved").with_description(e.to_string()),
            );
            Err(e.into())
        },
    }
}

async fn add_report(
    gateway: &Gateway,
    toasts: &ToastService,
    report: Report,
) -> anyhow::Result<Report> {
    match gateway.create(report).await {
        Ok(saved) => {
            toasts.show_success(ToastOptions::title("Report submitted").with_description(
                format!(
                    "Report #{} ({}) at {} filed",
                    saved.id.unwrap_or_default(),
                    saved.report_type,
                    saved.location
                ),
            ));
            Ok(saved)
        },
        Err(e) => {
            toasts.show_error(
                ToastOptions::title("Report not saved").with_description(e.to_string()),
            );
            Err(e.into())
        },
    }
}

async fn add_user(
    gateway: &Gateway,
    toasts: &ToastService,
    user: UserProfile,
) -> anyhow::Result<UserProfile> {
    match gateway.create(user).await {
        Ok(saved) => {
            toasts.show_success(ToastOptions::title("Welcome!").with_description(format!(
                "{} registered as user #{}",
                saved.full_name(),
                saved.id.unwrap_or_default()
            )));
            Ok(saved)
        },
        Err(e) => {
            toasts.show_error(
                ToastOptions::title("Registration failed").with_description(e.to_string()),
            );
            Err(e.into())
        },
    }
}

async fn remove<T: givers_persistence::Entity>(
    gateway: &Gateway,
    toasts: &ToastService,
    id: EntityId,
    label: &str,
) -> anyhow::Result<()> {
    match gateway.try_delete::<T>(id).await {
        Ok(true) => {
            toasts.show_success(ToastOptions::title(format!("{label} #{id} deleted")));
            Ok(())
        },
        Ok(false) => {
            toasts.show_warning(ToastOptions::title(format!("{label} #{id} not found")));
            Ok(())
        },
        Err(e) => {
            toasts.show_error(
                ToastOptions::title(format!("{label} #{id} not deleted"))
                    .with_description(e.to_string()),
            );
            Err(e.into())
        },
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        givers_persistence::InMemoryStore,
        givers_toast::{ManualScheduler, Severity},
        rstest::rstest,
        std::sync::Arc,
    };

    fn setup() -> (Arc<InMemoryStore>, Gateway, ToastService) {
        let store = Arc::new(InMemoryStore::new());
        let gateway = Gateway::new(store.clone());
        let toasts = ToastService::new(Arc::new(ManualScheduler::new()));
        (store, gateway, toasts)
    }

    fn severities(toasts: &ToastService) -> Vec<Severity> {
        toasts.toasts().iter().map(|t| t.severity).collect()
    }

    #[rstest]
    #[case("25", 2_500)]
    #[case("19.99", 1_999)]
    #[case("0.5", 50)]
    #[case(".75", 75)]
    #[case(" 100.00 ", 10_000)]
    fn amounts_parse(#[case] input: &str, #[case] cents: i64) {
        assert_eq!(parse_amount_cents(input).unwrap(), cents);
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("1.999")]
    #[case("-5")]
    #[case("0")]
    #[case("1.x")]
    fn bad_amounts_rejected(#[case] input: &str) {
        assert!(parse_amount_cents(input).is_err());
    }

    #[tokio::test]
    async fn add_donation_toasts_success() {
        let (_, gateway, toasts) = setup();
        let saved = add_donation(&gateway, &toasts, Donation::new("Ada", 2_500, "Food Aid"))
            .await
            .unwrap();
        assert_eq!(saved.id, Some(1));
        assert_eq!(severities(&toasts), vec![Severity::Success]);
        let description = toasts.toasts()[0].description.clone().unwrap();
        assert!(description.contains("25.00"), "{description}");
    }

    #[tokio::test]
    async fn add_donation_failure_toasts_error() {
        let (store, gateway, toasts) = setup();
        store.set_online(false);
        let result = add_donation(&gateway, &toasts, Donation::new("Ada", 100, "General")).await;
        assert!(result.is_err());
        assert_eq!(severities(&toasts), vec![Severity::Error]);
    }

    #[tokio::test]
    async fn get_distinguishes_missing_from_failure() {
        let (store, gateway, toasts) = setup();
        assert!(get_donation(&gateway, &toasts, 9).await.unwrap().is_none());
        assert_eq!(severities(&toasts), vec![Severity::Warning]);

        store.set_online(false);
        assert!(get_donation(&gateway, &toasts, 9).await.is_err());
        assert_eq!(severities(&toasts), vec![Severity::Warning, Severity::Error]);
    }

    #[tokio::test]
    async fn add_user_uses_full_name() {
        let (_, gateway, toasts) = setup();
        let saved = add_user(
            &gateway,
            &toasts,
            UserProfile::new("Amara", "Okafor", "amara@example.org", Role::Volunteer),
        )
        .await
        .unwrap();
        assert_eq!(saved.id, Some(1));
        assert_eq!(gateway.get_all::<UserProfile>().await, vec![saved]);

        let description = toasts.toasts()[0].description.clone().unwrap();
        assert_eq!(description, "Amara Okafor registered as user #1");
    }

    #[tokio::test]
    async fn remove_outcomes() {
        let (store, gateway, toasts) = setup();
        let saved = add_report(
            &gateway,
            &toasts,
            Report::new("Thandi", "t@example.org", "Flood", "Durban", "Roads cut off"),
        )
        .await
        .unwrap();
        let id = saved.id.unwrap();

        remove::<Report>(&gateway, &toasts, id, "Report").await.unwrap();
        remove::<Report>(&gateway, &toasts, id, "Report").await.unwrap();
        store.set_online(false);
        assert!(remove::<Report>(&gateway, &toasts, id, "Report").await.is_err());

        // Capacity is three, so the creation toast has been evicted.
        assert_eq!(
            severities(&toasts),
            vec![Severity::Success, Severity::Warning, Severity::Error]
        );
        assert!(toasts.toasts()[0].title.as_deref().unwrap().contains("deleted"));
    }
}
