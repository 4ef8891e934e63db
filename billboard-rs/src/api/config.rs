pub mod get {
    use crate::api::RouteConfig;
    use bb_server_macros::HttpStatusCode;
    use serde::{Deserialize, Serialize};

    /// Query string. A missing `route` reads the `default` route.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct Query {
        pub route: Option<String>,
    }

    #[derive(Debug, Clone, HttpStatusCode, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum Response {
        #[http(status = 200)]
        Ok { route: String, config: RouteConfig },
        #[http(status = 400)]
        Invalid { reason: String },
        #[http(status = 500)]
        Internal,
    }
}

pub mod update {
    use crate::api::RouteConfig;
    use bb_server_macros::HttpStatusCode;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Request {
        pub route: String,
        /// Seconds per image. Left unchanged when omitted.
        #[serde(default)]
        pub duration: Option<u32>,
        pub selected_folders: Vec<String>,
    }

    #[derive(Debug, Clone, HttpStatusCode, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum Response {
        /// The configuration as stored after normalization.
        #[http(status = 200)]
        Ok { config: RouteConfig },
        #[http(status = 400)]
        Invalid { reason: String },
        #[http(status = 401)]
        Unauthorized,
        #[http(status = 500)]
        Internal,
    }
}
