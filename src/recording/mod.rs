pub mod indicator;
pub mod navigation;
pub mod recorder;
pub mod selector;

pub use indicator::{OverlayIndicator, RecordingObserver, INDICATOR_ID};
pub use navigation::NavigationSubscription;
pub use recorder::{Recorder, StepUpdate, IGNORE_ATTRIBUTE};
pub use selector::synthesize_selector;
