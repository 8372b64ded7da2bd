use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use triphase_crypto::utilities::create_hmac;

use super::client;

pub const AUTHENTICATION_TAG_HEADER: &str = "X-Triphase-Signature";

pub struct Client {
    base_url: String,
    key: Option<String>,
}

impl Client {
    pub fn new(base_url: String, key: Option<String>) -> Self {
        Self { base_url, key }
    }

    pub fn tag(&self, body: &[u8]) -> Option<String> {
        self.key
            .as_ref()
            .map(|key| hex::encode(create_hmac(key.as_bytes(), body).unwrap()))
    }

    pub async fn pre_sign(&self, body: Value) -> Response {
        self.post("/api/triphase/v1/pre-sign", body).await
    }

    pub async fn post_sign(&self, body: Value) -> Response {
        self.post("/api/triphase/v1/post-sign", body).await
    }

    /// Sends `body` with a valid authentication tag
    pub async fn post(&self, path: &str, body: Value) -> Response {
        let body = serde_json::to_vec(&body).unwrap();
        let tag = self.tag(&body);
        self.post_raw(path, body, tag.as_deref()).await
    }

    pub async fn post_raw(&self, path: &str, body: Vec<u8>, tag: Option<&str>) -> Response {
        let url = format!("{}{path}", self.base_url);

        let mut request = client()
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(tag) = tag {
            request = request.header(AUTHENTICATION_TAG_HEADER, tag);
        }

        Response {
            resp: request.send().await.unwrap(),
        }
    }

    pub async fn get(&self, path: &str) -> Response {
        let url = format!("{}{path}", self.base_url);
        Response {
            resp: client().get(url).send().await.unwrap(),
        }
    }
}

pub struct Response {
    resp: reqwest::Response,
}

impl Response {
    pub fn status(&self) -> u16 {
        self.resp.status().into()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.resp
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned)
    }

    pub async fn json_value(self) -> Value {
        let full = self.resp.bytes().await.unwrap();
        serde_json::from_slice(&full).unwrap()
    }
}
