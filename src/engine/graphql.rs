// GraphQL schema served by the bundled server
// A small schema that exercises single, mutation, and streamed responses

use std::{sync::Arc, time::Duration};

use async_graphql::{Context, Object, Schema, Subscription};
use futures::{stream, Stream, StreamExt};
use tokio::sync::RwLock;
use tokio_stream::wrappers::IntervalStream;
use tracing::debug;

use crate::models::RawRequest;

pub type GatewaySchema = Schema<Query, Mutation, Subscription>;

/// Who `hello` greets; shared by every request against one schema
#[derive(Clone)]
pub struct Greeting(Arc<RwLock<String>>);

impl Greeting {
    pub fn new(target: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(target.into())))
    }
}

impl Default for Greeting {
    fn default() -> Self {
        Self::new("world")
    }
}

pub struct Query;

#[Object]
impl Query {
    /// Current greeting target
    async fn hello(&self, ctx: &Context<'_>) -> async_graphql::Result<String> {
        let greeting = ctx.data::<Greeting>()?;
        Ok(greeting.0.read().await.clone())
    }

    /// Returns its argument unchanged
    async fn echo(&self, message: String) -> String {
        message
    }

    /// Header of the HTTP request carrying this operation, when the server
    /// attached the request to the operation context
    async fn request_header(&self, ctx: &Context<'_>, name: String) -> Option<String> {
        ctx.data_opt::<RawRequest>()
            .and_then(|request| request.header(&name))
            .map(str::to_string)
    }
}

pub struct Mutation;

#[Object]
impl Mutation {
    /// Replace the greeting target, returning the new value
    async fn set_greeting(&self, ctx: &Context<'_>, greeting: String) -> async_graphql::Result<String> {
        let current = ctx.data::<Greeting>()?;
        *current.0.write().await = greeting.clone();
        debug!("Greeting changed to {}", greeting);
        Ok(greeting)
    }
}

pub struct Subscription;

#[Subscription]
impl Subscription {
    /// Counts down from `from` to zero, one value per tick
    async fn countdown(
        &self,
        from: i32,
        #[graphql(default = 1000)] interval_ms: i32,
    ) -> impl Stream<Item = i32> {
        let period = Duration::from_millis(interval_ms.max(1) as u64);
        let ticks = IntervalStream::new(tokio::time::interval(period));

        ticks
            .zip(stream::iter((0..=from.max(0)).rev()))
            .map(|(_, value)| value)
    }
}

pub fn create_schema() -> GatewaySchema {
    create_schema_with_greeting(Greeting::default())
}

pub fn create_schema_with_greeting(greeting: Greeting) -> GatewaySchema {
    Schema::build(Query, Mutation, Subscription)
        .data(greeting)
        .finish()
}
