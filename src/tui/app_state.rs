use crate::collections::Identifier;
use crate::picker::PickerPolicy;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub(super) enum AppMode {
    Browsing,
    Searching,
}

/// Startup parameters for one picker session.
#[derive(Debug, Clone, Default)]
pub struct PickerOptions {
    pub initial_location: Option<Identifier>,
    pub search_text: String,
    pub policy: PickerPolicy,
}
