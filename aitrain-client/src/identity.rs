//! Identity endpoint

use crate::error::{ClientError, Result};
use crate::TrainingClient;
use aitrain_core::domain::me::Me;

impl TrainingClient {
    /// Get the identity the token belongs to
    ///
    /// This is the probe run by every `connect*` constructor.
    ///
    /// # Errors
    /// [`ClientError::Auth`] when the service refuses the token.
    pub async fn me(&self) -> Result<Me> {
        let response = self.get(self.endpoint(["v1", "me"])?).send().await?;

        Self::handle_response(response, ClientError::auth).await
    }
}
