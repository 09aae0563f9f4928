use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::scheduler::Scheduler;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub scheduler: Scheduler,
    pub pipeline: Pipeline,
}
