use crate::handler::ReviewHandler;

pub(crate) struct ApiServerState {
    pub(crate) handler: ReviewHandler,
}
