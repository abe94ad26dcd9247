use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use givers_toast::{Severity, ToastMessage, ToastService};

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Subscribe a renderer that prints each toast once, when it first appears.
pub fn attach_renderer(service: &Arc<ToastService>) {
    let weak = Arc::downgrade(service);
    let printed: Mutex<HashSet<String>> = Mutex::new(HashSet::new());
    service.subscribe(move || {
        let Some(service) = weak.upgrade() else {
            return;
        };
        let mut printed = printed.lock().unwrap_or_else(|e| e.into_inner());
        for toast in service.toasts() {
            if printed.insert(toast.id.clone()) {
                eprintln!("{}", render(&toast));
            }
        }
    });
}

/// One-line terminal rendering of a toast.
pub fn render(toast: &ToastMessage) -> String {
    let (color, label) = match toast.severity {
        Severity::Default => ("", "note"),
        Severity::Success => (GREEN, "ok"),
        Severity::Warning => (YELLOW, "warning"),
        Severity::Error => (RED, "error"),
    };
    let line = match (toast.title.as_deref(), toast.description.as_deref()) {
        (Some(title), Some(description)) => {
            format!("{BOLD}{color}{label}{RESET} {title}: {description}")
        },
        (Some(text), None) | (None, Some(text)) => format!("{BOLD}{color}{label}{RESET} {text}"),
        (None, None) => format!("{BOLD}{color}{label}{RESET}"),
    };
    if toast.auto_dismisses() {
        line
    } else {
        format!("{line} {DIM}(pinned){RESET}")
    }
}
