//! The security pipeline: flag-driven content transformation.
//!
//! Applies the declared security flags transparently around upload and
//! download. On the way in, confidential content is sealed and its key
//! wrapped; on the way out, content is opened and then verified against the
//! uploader's signature. The order is fixed: decrypt before verify -
//! signatures cover plaintext.

use bytes::Bytes;
use tracing::{debug, info};

use docvault_core::{
    DocumentDownload, DocumentName, DocumentRecord, SecurityFlag, SecurityFlags, Signature,
    UserPublicKey, WrappedKey,
};

use crate::crypto::{verify_content, ContentKey, ServerKeyPair};
use crate::envelope::SealedContent;
use crate::error::{Result, SealError};

/// Content prepared for storage by the upload path.
#[derive(Debug, Clone)]
pub struct SealedUpload {
    /// Bytes to persist as the document content.
    pub content: Bytes,
    /// RSA-wrapped content key, present iff the upload is confidential.
    pub wrapped_key: Option<WrappedKey>,
    /// Caller-supplied signature, present iff the upload declares integrity.
    pub signature: Option<Signature>,
}

/// The security pipeline around a single server keypair.
pub struct SecurityPipeline {
    server_keys: ServerKeyPair,
}

impl SecurityPipeline {
    /// Create a pipeline over the server keypair.
    pub fn new(server_keys: ServerKeyPair) -> Self {
        Self { server_keys }
    }

    /// The server keypair's public half.
    pub fn server_public_key(&self) -> &rsa::RsaPublicKey {
        self.server_keys.public_key()
    }

    /// Transform content for storage according to the requested flags.
    ///
    /// Confidential uploads get a fresh random content key; the raw key and
    /// the plaintext never leave this function. Integrity uploads must carry
    /// a caller-computed signature - the server never signs content.
    pub fn seal(
        &self,
        name: &DocumentName,
        content: &[u8],
        flags: SecurityFlags,
        signature: Option<Signature>,
    ) -> Result<SealedUpload> {
        let (content, wrapped_key) = if flags.contains(SecurityFlag::Confidentiality) {
            info!(document = %name, "confidentiality requested, sealing content before write");

            let key = ContentKey::generate();
            let envelope = SealedContent::seal(content, &key)?;
            let wrapped = self.server_keys.wrap_key(&key)?;

            (Bytes::from(envelope.to_bytes()), Some(wrapped))
        } else {
            debug!(document = %name, "confidentiality not requested, storing content as-is");
            (Bytes::copy_from_slice(content), None)
        };

        let signature = if flags.contains(SecurityFlag::Integrity) {
            Some(signature.ok_or(SealError::MissingSignature)?)
        } else {
            None
        };

        Ok(SealedUpload {
            content,
            wrapped_key,
            signature,
        })
    }

    /// Reverse the upload transformation for a stored record.
    ///
    /// `uploader_key` must be supplied when the flags declare integrity; it
    /// is the declared uploader's registered public key. Any crypto failure
    /// aborts the download - no partial or unverified plaintext escapes.
    pub fn open(
        &self,
        record: &DocumentRecord,
        flags: SecurityFlags,
        uploader_key: Option<&UserPublicKey>,
    ) -> Result<DocumentDownload> {
        let content = if flags.contains(SecurityFlag::Confidentiality) {
            info!(document = %record.name, "confidentiality set, opening sealed content");

            let wrapped = record
                .wrapped_key
                .as_ref()
                .ok_or(SealError::MissingWrappedKey)?;
            let key = self.server_keys.unwrap_key(wrapped)?;
            let envelope = SealedContent::from_bytes(&record.content)?;
            envelope.open(&key)?
        } else {
            record.content.to_vec()
        };

        if flags.contains(SecurityFlag::Integrity) {
            info!(
                document = %record.name,
                uploader = %record.uploader,
                "integrity set, verifying signature against uploader key"
            );

            let signature = record.signature.as_ref().ok_or(SealError::MissingSignature)?;
            let key = uploader_key.ok_or(SealError::MissingVerificationKey)?;

            if !verify_content(key, &content, signature)? {
                return Err(SealError::IntegrityVerificationFailed);
            }

            debug!(document = %record.name, "signature verified");
        }

        Ok(DocumentDownload {
            name: record.name.clone(),
            uploader: record.uploader.clone(),
            content: Bytes::from(content),
            signature: record.signature.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{export_public_key, sign_content};
    use docvault_core::UserName;
    use rsa::RsaPrivateKey;

    fn pipeline() -> SecurityPipeline {
        SecurityPipeline::new(ServerKeyPair::generate_with_bits(1024).unwrap())
    }

    fn uploader_keys() -> (RsaPrivateKey, UserPublicKey) {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
        let record = export_public_key(&private.to_public_key());
        (private, record)
    }

    fn record_from(upload: SealedUpload) -> DocumentRecord {
        DocumentRecord {
            name: DocumentName::new("report.txt"),
            content: upload.content,
            uploader: UserName::new("alice"),
            wrapped_key: upload.wrapped_key,
            signature: upload.signature,
        }
    }

    #[test]
    fn test_plain_passthrough() {
        let pipeline = pipeline();
        let name = DocumentName::new("report.txt");

        let upload = pipeline
            .seal(&name, b"plain body", SecurityFlags::NONE, None)
            .unwrap();
        assert_eq!(upload.content.as_ref(), b"plain body");
        assert!(upload.wrapped_key.is_none());
        assert!(upload.signature.is_none());

        let download = pipeline
            .open(&record_from(upload), SecurityFlags::NONE, None)
            .unwrap();
        assert_eq!(download.content.as_ref(), b"plain body");
    }

    #[test]
    fn test_confidential_roundtrip() {
        let pipeline = pipeline();
        let name = DocumentName::new("report.txt");
        let flags = SecurityFlags::from(SecurityFlag::Confidentiality);

        let upload = pipeline.seal(&name, b"secret body", flags, None).unwrap();

        // Neither the plaintext nor the raw key may appear in storage
        assert_ne!(upload.content.as_ref(), b"secret body");
        assert!(upload.wrapped_key.is_some());

        let download = pipeline.open(&record_from(upload), flags, None).unwrap();
        assert_eq!(download.content.as_ref(), b"secret body");
    }

    #[test]
    fn test_integrity_verifies_and_rejects_tampering() {
        let pipeline = pipeline();
        let name = DocumentName::new("report.txt");
        let flags = SecurityFlags::from(SecurityFlag::Integrity);
        let (private, public) = uploader_keys();

        let signature = sign_content(&private, b"signed body");
        let upload = pipeline
            .seal(&name, b"signed body", flags, Some(signature))
            .unwrap();

        let mut record = record_from(upload);
        let download = pipeline.open(&record, flags, Some(&public)).unwrap();
        assert_eq!(download.content.as_ref(), b"signed body");

        // One flipped content byte must fail verification
        let mut tampered = record.content.to_vec();
        tampered[0] ^= 0x01;
        record.content = Bytes::from(tampered);

        assert!(matches!(
            pipeline.open(&record, flags, Some(&public)),
            Err(SealError::IntegrityVerificationFailed)
        ));
    }

    #[test]
    fn test_both_flags_decrypts_then_verifies() {
        let pipeline = pipeline();
        let name = DocumentName::new("report.txt");
        let flags = SecurityFlags::from(SecurityFlag::Confidentiality).with(SecurityFlag::Integrity);
        let (private, public) = uploader_keys();

        // Signature is computed over the original plaintext
        let signature = sign_content(&private, b"secret signed body");
        let upload = pipeline
            .seal(&name, b"secret signed body", flags, Some(signature))
            .unwrap();

        let download = pipeline
            .open(&record_from(upload), flags, Some(&public))
            .unwrap();
        assert_eq!(download.content.as_ref(), b"secret signed body");
    }

    #[test]
    fn test_integrity_upload_without_signature_rejected() {
        let pipeline = pipeline();
        let name = DocumentName::new("report.txt");
        let flags = SecurityFlags::from(SecurityFlag::Integrity);

        assert!(matches!(
            pipeline.seal(&name, b"body", flags, None),
            Err(SealError::MissingSignature)
        ));
    }

    #[test]
    fn test_integrity_open_without_key_rejected() {
        let pipeline = pipeline();
        let name = DocumentName::new("report.txt");
        let flags = SecurityFlags::from(SecurityFlag::Integrity);
        let (private, _) = uploader_keys();

        let signature = sign_content(&private, b"body");
        let upload = pipeline.seal(&name, b"body", flags, Some(signature)).unwrap();

        assert!(matches!(
            pipeline.open(&record_from(upload), flags, None),
            Err(SealError::MissingVerificationKey)
        ));
    }

    #[test]
    fn test_corrupt_wrapped_key_is_hard_error() {
        let pipeline = pipeline();
        let name = DocumentName::new("report.txt");
        let flags = SecurityFlags::from(SecurityFlag::Confidentiality);

        let upload = pipeline.seal(&name, b"secret", flags, None).unwrap();
        let mut record = record_from(upload);

        let mut corrupted = record.wrapped_key.as_ref().unwrap().as_bytes().to_vec();
        corrupted[0] ^= 0x01;
        record.wrapped_key = Some(WrappedKey::from_bytes(corrupted));

        assert!(pipeline.open(&record, flags, None).is_err());
    }
}
