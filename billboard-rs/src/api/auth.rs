pub mod login {
    use crate::api::SessionToken;
    use bb_server_macros::HttpStatusCode;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Request {
        pub password: String,
    }

    /// On success the session is also set as the `bb_session` cookie.
    #[derive(Debug, Clone, HttpStatusCode, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum Response {
        #[http(status = 200)]
        Ok {
            token: SessionToken,
            expires_at: DateTime<Utc>,
        },
        /// Wrong password.
        #[http(status = 401)]
        Unauthorized,
        #[http(status = 500)]
        Internal,
    }
}

pub mod check {
    use bb_server_macros::HttpStatusCode;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, HttpStatusCode, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum Response {
        #[http(status = 200)]
        Ok { expires_at: DateTime<Utc> },
        #[http(status = 401)]
        Unauthorized,
        /// The session could not be looked up.
        #[http(status = 500)]
        Internal,
    }
}

pub mod logout {
    use bb_server_macros::HttpStatusCode;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, HttpStatusCode, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum Response {
        #[http(status = 200)]
        Ok,
        #[http(status = 401)]
        Unauthorized,
        #[http(status = 500)]
        Internal,
    }
}
