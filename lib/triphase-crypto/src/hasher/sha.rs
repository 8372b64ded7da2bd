use sha2::{Digest, Sha256, Sha384, Sha512};

use super::Hasher;

pub struct SHA256 {}

impl Hasher for SHA256 {
    fn hash(&self, input: &[u8]) -> Vec<u8> {
        Sha256::digest(input).to_vec()
    }
}

pub struct SHA384 {}

impl Hasher for SHA384 {
    fn hash(&self, input: &[u8]) -> Vec<u8> {
        Sha384::digest(input).to_vec()
    }
}

pub struct SHA512 {}

impl Hasher for SHA512 {
    fn hash(&self, input: &[u8]) -> Vec<u8> {
        Sha512::digest(input).to_vec()
    }
}
