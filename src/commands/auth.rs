use anyhow::Result;
use tracing::debug;

use super::Context;
use crate::auth::authenticate_user;
use crate::backend::BackendClient;

pub async fn run(ctx: &mut Context, snyk_token: Option<&str>) -> Result<()> {
    debug!("executing auth command");
    let backend = BackendClient::new(ctx.client.as_str())?;
    authenticate_user(&mut ctx.config, &backend, &mut ctx.event, snyk_token).await
}
