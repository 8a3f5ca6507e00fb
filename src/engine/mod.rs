pub mod dispatch;
pub mod session;
pub mod shutdown;

pub use dispatch::{Admission, DispatchStop, Dispatcher};
pub use session::{IngestSession, SessionReport};
pub use shutdown::{Shutdown, ShutdownSignal};
