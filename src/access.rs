//! Static shared-token gate backing the dashboard unlock flow. This is
//! presentation-layer access control, not authentication: the token is a
//! plain configured constant.

use std::sync::Arc;

use actix_web::{error::ErrorInternalServerError, get, post, web, HttpResponse};
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::storage::Storage;

#[derive(Clone)]
pub struct AccessGate {
    storage: Arc<Storage>,
    master_token: String,
}

impl AccessGate {
    pub fn new(storage: Arc<Storage>, master_token: String) -> Self {
        Self {
            storage,
            master_token,
        }
    }

    /// Exact case-sensitive match. Persists the token only on success.
    pub fn verify(&self, candidate: &str) -> Result<bool> {
        if candidate != self.master_token {
            return Ok(false);
        }
        self.storage
            .set_access_token(Some(candidate.to_string()))?;
        Ok(true)
    }

    pub fn check_persisted(&self) -> bool {
        self.storage.access_token().as_deref() == Some(self.master_token.as_str())
    }

    pub fn logout(&self) -> Result<()> {
        self.storage.set_access_token(None)
    }
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    token: String,
}

#[derive(Debug, Serialize)]
struct AuthState {
    authenticated: bool,
}

#[post("/v1/auth/verify")]
pub async fn verify_service(
    data: web::Json<VerifyRequest>,
    gate: web::Data<AccessGate>,
) -> actix_web::Result<HttpResponse> {
    let ok = gate
        .verify(&data.token)
        .map_err(ErrorInternalServerError)?;
    let state = AuthState { authenticated: ok };
    if ok {
        Ok(HttpResponse::Ok().json(state))
    } else {
        Ok(HttpResponse::Unauthorized().json(state))
    }
}

#[get("/v1/auth")]
pub async fn state_service(gate: web::Data<AccessGate>) -> HttpResponse {
    HttpResponse::Ok().json(AuthState {
        authenticated: gate.check_persisted(),
    })
}

#[post("/v1/auth/logout")]
pub async fn logout_service(gate: web::Data<AccessGate>) -> actix_web::Result<HttpResponse> {
    gate.logout().map_err(ErrorInternalServerError)?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::{temp_path, temp_storage};

    const MASTER: &str = "NETSCAN-2024";

    #[test]
    fn master_token_unlocks_and_persists() {
        let path = temp_path();
        {
            let gate = AccessGate::new(
                Arc::new(Storage::open(path.clone()).unwrap()),
                MASTER.to_string(),
            );
            assert!(!gate.check_persisted());
            assert!(gate.verify(MASTER).unwrap());
        }
        // a fresh gate over the same storage sees the unlock
        let gate = AccessGate::new(Arc::new(Storage::open(path).unwrap()), MASTER.to_string());
        assert!(gate.check_persisted());
    }

    #[test]
    fn wrong_token_is_rejected_without_persisting() {
        let gate = AccessGate::new(temp_storage(), MASTER.to_string());
        assert!(!gate.verify("NETSCAN-XXXX").unwrap());
        assert!(!gate.verify("netscan-2024").unwrap());
        assert!(!gate.check_persisted());
    }

    #[test]
    fn logout_clears_the_unlock() {
        let gate = AccessGate::new(temp_storage(), MASTER.to_string());
        assert!(gate.verify(MASTER).unwrap());
        gate.logout().unwrap();
        assert!(!gate.check_persisted());
    }
}
