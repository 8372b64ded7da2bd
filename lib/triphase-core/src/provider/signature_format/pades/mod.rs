//! PAdES baseline signatures appended to the PDF as an incremental update.
//!
//! The update adds a signature dictionary, an invisible signature field referenced from
//! the catalog's AcroForm, a cross-reference section and a trailer chained to the
//! original one through `/Prev`. `/ByteRange` covers the whole output except the
//! `/Contents` hole that receives the detached CMS.

use std::ops::Range;
use std::sync::Arc;

use der::{Decode, Header, Reader, SliceReader};
use lopdf::{Dictionary, Document, IncrementalDocument, Object, ObjectId, StringFormat, dictionary};
use time::macros::format_description;
use triphase_crypto::CryptoProvider;

use super::cades::cms;
use super::error::FormatError;
use super::{SignatureFormatter, SigningInput, cms_signature_value};


const PDF_HEADER: &[u8] = b"%PDF-";
const SUB_FILTER: &[u8] = b"ETSI.CAdES.detached";
/// Bytes reserved for the CMS container
const CONTENTS_CAPACITY: usize = 16 * 1024;
/// Wide enough for any offset the `/ByteRange` is patched with
const BYTE_RANGE_PLACEHOLDER: i64 = 9_999_999_999;

pub struct PAdESFormatter {
    crypto: Arc<dyn CryptoProvider>,
}

/// The incremental update with `/ByteRange` final and `/Contents` still zeroed
struct PreparedDocument {
    bytes: Vec<u8>,
    /// `<...>` of the `/Contents` string, delimiters included
    hole: Range<usize>,
}

impl PreparedDocument {
    fn covered(&self) -> Vec<u8> {
        [&self.bytes[..self.hole.start], &self.bytes[self.hole.end..]].concat()
    }
}

fn structure(message: impl Into<String>) -> FormatError {
    FormatError::InvalidStructure(message.into())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Follows one level of indirection
fn resolve<'a>(document: &'a Document, object: &'a Object) -> Result<&'a Object, FormatError> {
    match object {
        Object::Reference(id) => Ok(document.get_object(*id)?),
        object => Ok(object),
    }
}

fn resolved_array(document: &Document, dictionary: &Dictionary, key: &[u8]) -> Vec<Object> {
    dictionary
        .get(key)
        .ok()
        .and_then(|object| resolve(document, object).ok())
        .and_then(|object| object.as_array().ok())
        .cloned()
        .unwrap_or_default()
}

fn root_id(document: &Document) -> Result<ObjectId, FormatError> {
    Ok(document.trailer.get(b"Root")?.as_reference()?)
}

impl PAdESFormatter {
    pub fn new(crypto: Arc<dyn CryptoProvider>) -> Self {
        Self { crypto }
    }

    fn parse(document: &[u8]) -> Result<Document, FormatError> {
        if !document.starts_with(PDF_HEADER) {
            return Err(FormatError::UnsupportedDocument(
                "missing PDF header".to_owned(),
            ));
        }
        let parsed = Document::load_mem(document)
            .map_err(|e| FormatError::UnsupportedDocument(format!("unreadable PDF: {e}")))?;
        if parsed.is_encrypted() {
            return Err(FormatError::UnsupportedDocument(
                "encrypted PDF".to_owned(),
            ));
        }
        Ok(parsed)
    }

    /// Builds the incremental update; deterministic for the same input
    fn prepare(&self, input: SigningInput<'_>) -> Result<PreparedDocument, FormatError> {
        let previous = Self::parse(input.document)?;
        let root_id = root_id(&previous)?;
        let first_page = previous.get_pages().values().next().copied();

        let signing_time = input
            .params
            .signing_time
            .format(format_description!(
                "D:[year][month][day][hour][minute][second]Z"
            ))
            .map_err(|e| FormatError::Encoding(e.to_string()))?;

        let mut catalog = previous.get_dictionary(root_id)?.clone();
        let mut acro_form = catalog
            .get(b"AcroForm")
            .ok()
            .and_then(|object| resolve(&previous, object).ok())
            .and_then(|object| object.as_dict().ok())
            .cloned()
            .unwrap_or_default();
        let mut fields = resolved_array(&previous, &acro_form, b"Fields");
        let page = match first_page {
            Some(page_id) => Some((
                page_id,
                previous.get_dictionary(page_id)?.clone(),
                resolved_array(&previous, previous.get_dictionary(page_id)?, b"Annots"),
            )),
            None => None,
        };

        let mut update = IncrementalDocument::create_from(input.document.to_vec(), previous);
        let new_document = &mut update.new_document;

        let signature_id = new_document.add_object(dictionary! {
            "Type" => "Sig",
            "Filter" => "Adobe.PPKLite",
            "SubFilter" => Object::Name(SUB_FILTER.to_vec()),
            "ByteRange" => vec![
                Object::Integer(0),
                Object::Integer(BYTE_RANGE_PLACEHOLDER),
                Object::Integer(BYTE_RANGE_PLACEHOLDER),
                Object::Integer(BYTE_RANGE_PLACEHOLDER),
            ],
            "Contents" => Object::String(vec![0; CONTENTS_CAPACITY], StringFormat::Hexadecimal),
            "M" => Object::string_literal(signing_time),
        });

        let mut field = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Sig",
            "T" => Object::string_literal(format!("Signature{}", fields.len() + 1)),
            "V" => Object::Reference(signature_id),
            "F" => Object::Integer(132),
            "Rect" => vec![Object::Integer(0); 4],
        };
        if let Some((page_id, _, _)) = &page {
            field.set("P", Object::Reference(*page_id));
        }
        let field_id = new_document.add_object(field);

        if let Some((page_id, mut page, mut annotations)) = page {
            annotations.push(Object::Reference(field_id));
            page.set("Annots", annotations);
            new_document.objects.insert(page_id, Object::Dictionary(page));
        }

        fields.push(Object::Reference(field_id));
        acro_form.set("Fields", fields);
        acro_form.set("SigFlags", Object::Integer(3));
        catalog.set("AcroForm", Object::Dictionary(acro_form));
        new_document
            .objects
            .insert(root_id, Object::Dictionary(catalog));

        let mut bytes = vec![];
        update.save_to(&mut bytes)?;
        let update_start = input.document.len();

        let placeholder = [b"<".as_slice(), &[b'0'; 2 * CONTENTS_CAPACITY], b">"].concat();
        let hole_start = find(&bytes[update_start..], &placeholder)
            .map(|position| update_start + position)
            .ok_or_else(|| structure("signature contents placeholder not written"))?;
        let hole = hole_start..hole_start + placeholder.len();

        let byte_range = find(&bytes[update_start..], b"/ByteRange")
            .map(|position| update_start + position)
            .ok_or_else(|| structure("byte range placeholder not written"))?;
        let open = byte_range
            + find(&bytes[byte_range..], b"[").ok_or_else(|| structure("invalid /ByteRange"))?;
        let close = open
            + find(&bytes[open..], b"]").ok_or_else(|| structure("invalid /ByteRange"))?;

        let values = format!(
            "0 {} {} {}",
            hole.start,
            hole.end,
            bytes.len() - hole.end
        );
        let slot = &mut bytes[open + 1..close];
        if values.len() > slot.len() {
            return Err(structure("byte range does not fit its placeholder"));
        }
        slot.fill(b' ');
        slot[..values.len()].copy_from_slice(values.as_bytes());

        Ok(PreparedDocument { bytes, hole })
    }

    fn message_digest(
        &self,
        input: SigningInput<'_>,
        covered: &[u8],
    ) -> Result<Vec<u8>, FormatError> {
        Ok(self
            .crypto
            .get_hasher(input.params.algorithm.digest_algorithm())?
            .hash(covered))
    }
}

/// Signature dictionaries of all signature fields, in field order
fn signature_dictionaries(document: &Document) -> Result<Vec<&Dictionary>, FormatError> {
    let catalog = document.get_dictionary(root_id(document)?)?;
    let acro_form = resolve(document, catalog.get(b"AcroForm")?)?.as_dict()?;
    let fields = resolve(document, acro_form.get(b"Fields")?)?.as_array()?;

    let mut signatures = vec![];
    for field in fields {
        let field = resolve(document, field)?.as_dict()?;
        if field.get(b"FT").and_then(Object::as_name).ok() != Some(b"Sig".as_slice()) {
            continue;
        }
        if let Ok(value) = field.get(b"V") {
            signatures.push(resolve(document, value)?.as_dict()?);
        }
    }
    Ok(signatures)
}

/// Strips the zero padding after the DER encoded container
fn trim_der(contents: &[u8]) -> Result<&[u8], FormatError> {
    let mut reader = SliceReader::new(contents)?;
    let header = Header::decode(&mut reader)?;
    let length = usize::try_from((reader.position() + header.length)?)?;
    contents
        .get(..length)
        .ok_or_else(|| structure("truncated signature contents"))
}

impl SignatureFormatter for PAdESFormatter {
    fn check_document(&self, document: &[u8]) -> Result<(), FormatError> {
        Self::parse(document).map(|_| ())
    }

    /// The CMS is always detached, the PDF itself carries the content
    fn pre_sign(&self, input: SigningInput<'_>) -> Result<Vec<u8>, FormatError> {
        let prepared = self.prepare(input)?;
        let message_digest = self.message_digest(input, &prepared.covered())?;
        Ok(cms::signed_attributes(input, &message_digest))
    }

    fn assemble(&self, input: SigningInput<'_>, signature: &[u8]) -> Result<Vec<u8>, FormatError> {
        let PreparedDocument { mut bytes, hole } = self.prepare(input)?;
        let message_digest = self.message_digest(
            input,
            &[&bytes[..hole.start], &bytes[hole.end..]].concat(),
        )?;

        let signature = cms_signature_value(input.params.algorithm, signature)?;
        let container = hex::encode_upper(cms::signed_data(input, &message_digest, &signature, None));

        let slot = &mut bytes[hole.start + 1..hole.end - 1];
        if container.len() > slot.len() {
            return Err(structure("signature container exceeds the reserved space"));
        }
        slot[..container.len()].copy_from_slice(container.as_bytes());

        Ok(bytes)
    }

    fn validate(&self, signed: &[u8], input: SigningInput<'_>) -> Result<(), FormatError> {
        if !signed.starts_with(input.document) {
            return Err(structure("original revision was modified"));
        }

        let document = Document::load_mem(signed)?;
        let signature = signature_dictionaries(&document)?
            .pop()
            .ok_or_else(|| structure("no signature field"))?;

        if signature.get(b"SubFilter").and_then(Object::as_name).ok() != Some(SUB_FILTER) {
            return Err(structure("unexpected /SubFilter"));
        }

        let byte_range = signature
            .get(b"ByteRange")?
            .as_array()?
            .iter()
            .map(|value| {
                value
                    .as_i64()
                    .ok()
                    .and_then(|value| usize::try_from(value).ok())
                    .ok_or_else(|| structure("invalid /ByteRange"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let [0, first_length, second_start, second_length] = byte_range.as_slice() else {
            return Err(structure("invalid /ByteRange"));
        };
        let (first_length, second_start, second_length) =
            (*first_length, *second_start, *second_length);

        // the hole is exactly the /Contents string and everything else is covered
        if second_start <= first_length
            || second_start.checked_add(second_length) != Some(signed.len())
            || signed.get(first_length) != Some(&b'<')
            || signed.get(second_start - 1) != Some(&b'>')
        {
            return Err(structure("/ByteRange does not cover the document"));
        }
        let covered = [&signed[..first_length], &signed[second_start..]].concat();

        let contents = signature.get(b"Contents")?.as_str()?;
        let parsed = cms::parse_signed_data(trim_der(contents)?)?;
        if parsed.content.is_some() {
            return Err(structure("embedded CMS must be detached"));
        }

        cms::verify_signed_data(&self.crypto, &parsed, &covered, input)
    }
}
