pub mod list {
    use crate::api::Image;
    use bb_server_macros::HttpStatusCode;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct Query {
        /// Folder path relative to the media root. Required.
        pub folder: Option<String>,
        /// Route whose enabled folders gate the listing. Inferred from `folder` when omitted.
        pub route: Option<String>,
        /// List everything in the folder regardless of schedule and enabled state. Admin only.
        #[serde(default)]
        pub all: Option<bool>,
    }

    // Governing rules:
    //  default: folder must be enabled for the route; only images inside their schedule window
    //  all=true: admin session required
    #[derive(Debug, Clone, HttpStatusCode, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum Response {
        #[http(status = 200)]
        Ok { images: Vec<Image> },
        #[http(status = 400)]
        Invalid { reason: String },
        #[http(status = 401)]
        Unauthorized,
        #[http(status = 500)]
        Internal,
    }
}

pub mod meta {
    use crate::api::Image;
    use bb_server_macros::HttpStatusCode;
    use serde::{Deserialize, Serialize};

    /// Times are RFC 3339, or `YYYY-MM-DDTHH:MM[:SS]` in the server's local time.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct Request {
        pub url: Option<String>,
        pub scheduled_at: Option<String>,
        pub expires_at: Option<String>,
    }

    #[derive(Debug, Clone, HttpStatusCode, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum Response {
        #[http(status = 200)]
        Ok { image: Image },
        #[http(status = 400)]
        Invalid { reason: String },
        #[http(status = 401)]
        Unauthorized,
        #[http(status = 500)]
        Internal,
    }
}

pub mod delete {
    use bb_server_macros::HttpStatusCode;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, HttpStatusCode, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum Response {
        #[http(status = 200)]
        Ok,
        #[http(status = 401)]
        Unauthorized,
        #[http(status = 404)]
        NotFound,
        #[http(status = 500)]
        Internal,
    }
}
