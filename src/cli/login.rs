use crate::{
    dab::{ApiError, auth},
    error, info,
    management::SessionManager,
    success,
};

pub async fn login(email: &str, password: &str) {
    let client = super::anonymous_client();

    info!("Logging in as {}...", email);
    let token = match auth::login(&client, email, password).await {
        Ok(token) => token,
        Err(ApiError::InvalidCredentials) => error!("Invalid email or password"),
        Err(e) => error!("Login failed. Err: {}", e),
    };

    if let Err(e) = SessionManager::new(token).persist().await {
        error!("Cannot store session. Err: {}", e);
    }

    success!("Logged in, session stored");
}
