mod actuator;
mod introspect;

pub use actuator::{fill_field, submit_form};
pub use introspect::introspect_forms;
