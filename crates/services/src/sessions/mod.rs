mod flow;
mod ticker;

pub use flow::QuizFlowService;
pub use ticker::{SessionTicker, TickEvent};
