mod command_input;
mod confirm;
mod form_panel;
mod input;
mod key_result;

pub use command_input::{CommandEvent, CommandInput};
pub use confirm::ConfirmDialog;
pub use form_panel::{FormEvent, FormPanel};
pub use key_result::KeyResult;
