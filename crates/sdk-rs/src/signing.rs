//! Signing feedback authorizations through a chain backend.

use erc8004_core::{
    AuthorizationDomain, CoreError, FeedbackAuthorization, SignedFeedbackAuthorization,
};
use tracing::debug;

use crate::adapter::BlockchainAdapter;
use crate::error::Result;

/// Sign `auth` under `domain` with the adapter's typed-data signer.
///
/// When the adapter reports a signer address it must be the authorization's
/// `signer_address`; otherwise nothing is signed. Adapter errors are returned as-is.
pub async fn sign_authorization(
    auth: FeedbackAuthorization,
    domain: &AuthorizationDomain,
    adapter: &dyn BlockchainAdapter,
) -> Result<SignedFeedbackAuthorization> {
    if let Some(address) = adapter.address() {
        if address != auth.signer_address {
            return Err(CoreError::InvalidParameter(format!(
                "adapter signs as {address} but the authorization names {}",
                auth.signer_address
            ))
            .into());
        }
    }

    let payload = auth.typed_data(domain);
    let signature = adapter.sign_typed_data(&payload).await?;

    debug!(
        agent_id = %auth.agent_id,
        client = %auth.client_address,
        index_limit = auth.index_limit,
        "Signed feedback authorization"
    );
    Ok(auth.into_signed(signature))
}
