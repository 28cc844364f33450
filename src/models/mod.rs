pub mod forms;
pub mod messages;
pub mod requests;
pub mod responses;
pub mod session;
pub mod workflow;

pub use forms::*;
pub use messages::*;
pub use requests::*;
pub use responses::*;
pub use session::*;
pub use workflow::*;
