use std::sync::OnceLock;

use ct_codecs::{Base64UrlSafeNoPadding, Decoder, Encoder};

pub mod api_client;
pub mod context;
pub mod signer;

pub fn client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

    CLIENT.get_or_init(|| reqwest::ClientBuilder::new().build().unwrap())
}

pub fn encode(value: &[u8]) -> String {
    Base64UrlSafeNoPadding::encode_to_string(value).unwrap()
}

pub fn decode(value: &str) -> Vec<u8> {
    Base64UrlSafeNoPadding::decode_to_vec(value, None).unwrap()
}
