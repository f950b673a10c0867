//! Native message boxes for warnings and yes/no questions

use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use std::fmt::Display;

use crate::APP_TITLE;

/// Show a warning with a headline and the underlying error text
pub fn warn(headline: &str, detail: &dyn Display) {
    tracing::warn!(%detail, "{}", headline);
    MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title(APP_TITLE)
        .set_description(format!("{}\n\n{}", headline, detail))
        .set_buttons(MessageButtons::Ok)
        .show();
}

/// Ask a yes/no question; anything but "Yes" counts as no
pub fn confirm(question: &str, detail: &str) -> bool {
    let description = if detail.is_empty() {
        question.to_string()
    } else {
        format!("{}\n\n{}", question, detail)
    };
    let answer = MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title(APP_TITLE)
        .set_description(description)
        .set_buttons(MessageButtons::YesNo)
        .show();
    answer == MessageDialogResult::Yes
}
