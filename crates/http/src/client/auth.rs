//! Authentication API client methods

use super::{ApiClient, ApiRequest, ClientError};
use crate::types::{Credentials, LoginResponse, LogoutRequest, RefreshResponse, UserProfile};

pub const LOGIN_PATH: &str = "/users/login/";
pub const PROFILE_PATH: &str = "/users/profile/";
pub const REFRESH_PATH: &str = "/users/refresh/";
pub const LOGOUT_PATH: &str = "/users/logout/";

impl ApiClient {
    /// Exchange credentials for tokens
    ///
    /// Sent without a stored token and outside the refresh path, so a rejected
    /// login leaves the session untouched.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ClientError> {
        let request = ApiRequest::post(LOGIN_PATH)
            .json(credentials)?
            .anonymous()
            .skip_refresh();
        self.execute(request).await
    }

    /// Fetch the profile of the token's owner
    pub async fn profile(&self) -> Result<UserProfile, ClientError> {
        self.get(PROFILE_PATH).await
    }

    /// Fetch the profile for a token that is not stored yet
    ///
    /// A rejected token is reported as is, without a refresh attempt.
    pub async fn profile_for_token(&self, access: &str) -> Result<UserProfile, ClientError> {
        self.execute(ApiRequest::get(PROFILE_PATH).bearer(access).skip_refresh())
            .await
    }

    /// Trade a refresh token for a new access token without touching the store
    pub async fn refresh(&self, refresh: &str) -> Result<RefreshResponse, ClientError> {
        self.request_refresh(refresh).await
    }

    /// Ask the server to invalidate the refresh token
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<(), ClientError> {
        let request = ApiRequest::post(LOGOUT_PATH)
            .json(&LogoutRequest {
                refresh_token: refresh_token.map(str::to_string),
            })?
            .skip_refresh();
        self.send(request).await.map(drop)
    }
}
