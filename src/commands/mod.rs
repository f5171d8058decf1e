//! Command implementations

pub mod declarative;
pub mod group;
pub mod site;
pub mod strategies;

use anyhow::Result;

use crate::Context;
use crate::config::DesiredState;
use crate::provider::{Provider, ProviderConfig};

/// Load the desired state and connect with the resolved provider settings
pub fn connect(ctx: &Context) -> Result<(Provider, DesiredState)> {
    let state = DesiredState::load(ctx.file.as_deref())?;
    let config = ProviderConfig::from_env(&ctx.provider_flags, &state.provider)?;
    let provider = Provider::configure(&config)?;
    Ok((provider, state))
}
