use crate::delivery::DeliveryBackend;
use pushrelay_core::Resolver;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) resolver: Resolver,
    pub(crate) delivery: Arc<dyn DeliveryBackend>,
}
