//! Account operations over the `/user` endpoints

use crate::client::{ApiClient, ClientError};
use crate::tokens::{TokenPair, TokenStore};
use crate::types::{
    LoginRequest, OAuthRegisterRequest, RegisterRequest, VerificationConfirm, VerificationRequest,
};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::{info, warn};

/// Account service
///
/// Every operation returns the backend's JSON body as is; a body that is not
/// JSON resolves to `{}`.
#[derive(Clone, Debug)]
pub struct AccountService {
    client: ApiClient,
    tokens: TokenStore,
}

impl AccountService {
    /// Create an account service sharing the client's token store
    pub fn new(client: ApiClient) -> Self {
        let tokens = client.tokens().clone();
        Self { client, tokens }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Log in with email and password and store the issued tokens
    pub async fn login(&self, email: &str, password: &str) -> Result<Value, ClientError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .client
            .post("/user/login", &request, false)
            .await
            .map_err(rejected_credentials)?;
        self.store_issued_tokens(&response);

        info!("Logged in");
        Ok(response)
    }

    /// Log in an account created through a social provider
    pub async fn oauth_login(&self, request: &OAuthRegisterRequest) -> Result<Value, ClientError> {
        let response = self
            .client
            .post("/user/oauth/login", request, false)
            .await
            .map_err(rejected_credentials)?;
        self.store_issued_tokens(&response);

        info!(provider = %request.social_code, "Logged in through OAuth");
        Ok(response)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<Value, ClientError> {
        self.client.post("/user/register", request, false).await
    }

    pub async fn oauth_register(&self, request: &OAuthRegisterRequest) -> Result<Value, ClientError> {
        self.client.post("/user/oauth/register", request, false).await
    }

    /// Ask the backend to mail a verification code
    pub async fn request_verification(&self, email: &str) -> Result<Value, ClientError> {
        let request = VerificationRequest {
            email: email.to_string(),
        };
        self.client.post("/user/verify/email", &request, false).await
    }

    /// Submit the mailed verification code
    pub async fn confirm_verification(&self, email: &str, code: &str) -> Result<Value, ClientError> {
        let request = VerificationConfirm {
            email: email.to_string(),
            code: code.to_string(),
        };
        self.client.post("/user/verify/confirm", &request, false).await
    }

    /// Profile of the logged in user
    pub async fn me(&self) -> Result<Value, ClientError> {
        self.client.get("/user/me", true).await
    }

    /// Tell the backend to end the session, then drop local tokens.
    ///
    /// Tokens are cleared once the backend call resolves, whatever its
    /// outcome; a backend failure is returned afterwards.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self.client.post("/user/logout", &json!({}), true).await;
        self.tokens.clear_tokens();

        match result {
            Ok(_) => {
                info!("Logged out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Logout request failed; local tokens cleared anyway");
                Err(e)
            }
        }
    }

    fn store_issued_tokens(&self, response: &Value) {
        match TokenPair::from_body(response) {
            Some(pair) => self.tokens.store_pair(&pair),
            None => warn!("Login response carried no access token"),
        }
    }
}

/// A 401 from a login endpoint is a rejected credential, not an expired
/// session; report it with the backend's message.
fn rejected_credentials(error: ClientError) -> ClientError {
    match error {
        ClientError::AuthExpired {
            body: Some(body), ..
        } => ClientError::from_response(StatusCode::UNAUTHORIZED, body),
        other => other,
    }
}
