//! Certificate material sources and PEM parsing.

// std
use std::{fs, io::Cursor, path::Path};
// crates.io
use reqwest::Identity;
use rustls::{
	Error as TlsError, InconsistentKeys,
	crypto::ring::sign,
	pki_types::{CertificateDer, PrivateKeyDer},
	sign::CertifiedKey,
};
use x509_parser::prelude::{FromDer, X509Certificate};
// self
use crate::{
	_prelude::*,
	config::{CERT_PATH_VAR, CertificatePaths, KEY_PATH_VAR},
	error::CredentialLoadError,
};

/// Supplies fresh mutual-TLS material on demand.
///
/// Implementations are called while the renewal guard is held, so at most one load per
/// transport runs at a time.
pub trait CertificateSource
where
	Self: Send + Sync,
{
	/// Loads and validates the current key pair.
	fn load(&self) -> Result<CertificateMaterial, CredentialLoadError>;
}

/// Reads the key pair from two PEM files on every load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileCertificateSource {
	paths: CertificatePaths,
}
impl FileCertificateSource {
	/// Creates a source for the given paths.
	pub fn new(paths: CertificatePaths) -> Self {
		Self { paths }
	}

	/// Returns the configured paths.
	pub fn paths(&self) -> &CertificatePaths {
		&self.paths
	}
}
impl CertificateSource for FileCertificateSource {
	fn load(&self) -> Result<CertificateMaterial, CredentialLoadError> {
		let cert_pem = read(&self.paths.certificate)?;
		let key_pem = read(&self.paths.key)?;

		CertificateMaterial::from_pem(&cert_pem, &key_pem)
	}
}

/// Resolves the key pair paths from environment variables on every load.
///
/// Defaults to `CF_INSTANCE_CERT` and `CF_INSTANCE_KEY`; an unset variable fails the load, not
/// the construction of the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnvCertificateSource {
	certificate_var: &'static str,
	key_var: &'static str,
}
impl EnvCertificateSource {
	/// Reads the paths from the named variables instead of the defaults.
	pub fn with_vars(certificate_var: &'static str, key_var: &'static str) -> Self {
		Self { certificate_var, key_var }
	}
}
impl Default for EnvCertificateSource {
	fn default() -> Self {
		Self::with_vars(CERT_PATH_VAR, KEY_PATH_VAR)
	}
}
impl CertificateSource for EnvCertificateSource {
	fn load(&self) -> Result<CertificateMaterial, CredentialLoadError> {
		let paths = CertificatePaths::from_vars(self.certificate_var, self.key_var)?;

		FileCertificateSource::new(paths).load()
	}
}

/// A validated key pair ready to be presented by a TLS client.
pub struct CertificateMaterial {
	identity: Identity,
	not_after: OffsetDateTime,
	subject: String,
}
impl CertificateMaterial {
	/// Parses a PEM certificate chain (leaf first) and its PEM private key.
	pub fn from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<Self, CredentialLoadError> {
		let chain = rustls_pemfile::certs(&mut Cursor::new(cert_pem))
			.collect::<Result<Vec<CertificateDer<'static>>, _>>()
			.map_err(|source| CredentialLoadError::MalformedPem { kind: "certificate", source })?;
		let leaf = chain.first().ok_or(CredentialLoadError::MissingCertificate)?;
		let (not_after, subject) = leaf_validity(leaf)?;
		let key = rustls_pemfile::private_key(&mut Cursor::new(key_pem))
			.map_err(|source| CredentialLoadError::MalformedPem { kind: "private key", source })?
			.ok_or(CredentialLoadError::MissingPrivateKey)?;

		ensure_pair_matches(chain.clone(), &key)?;

		let mut bundle = Vec::with_capacity(cert_pem.len() + key_pem.len() + 1);

		bundle.extend_from_slice(cert_pem);
		bundle.push(b'\n');
		bundle.extend_from_slice(key_pem);

		let identity =
			Identity::from_pem(&bundle).map_err(|source| CredentialLoadError::Identity { source })?;

		Ok(Self { identity, not_after, subject })
	}

	/// Expiry instant of the leaf certificate.
	pub fn not_after(&self) -> OffsetDateTime {
		self.not_after
	}

	/// Subject distinguished name of the leaf certificate.
	pub fn subject(&self) -> &str {
		&self.subject
	}

	pub(crate) fn into_identity(self) -> Identity {
		self.identity
	}
}
impl Debug for CertificateMaterial {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CertificateMaterial")
			.field("subject", &self.subject)
			.field("not_after", &self.not_after)
			.field("identity", &"<redacted>")
			.finish()
	}
}

fn read(path: &Path) -> Result<Vec<u8>, CredentialLoadError> {
	fs::read(path).map_err(|source| CredentialLoadError::Read { path: path.to_owned(), source })
}

fn leaf_validity(leaf: &CertificateDer<'_>) -> Result<(OffsetDateTime, String), CredentialLoadError> {
	let (_, cert) = X509Certificate::from_der(leaf.as_ref())
		.map_err(|e| CredentialLoadError::InvalidCertificate { reason: e.to_string() })?;
	let not_after = OffsetDateTime::from_unix_timestamp(cert.validity().not_after.timestamp())
		.map_err(|e| CredentialLoadError::InvalidCertificate { reason: e.to_string() })?;

	Ok((not_after, cert.subject().to_string()))
}

fn ensure_pair_matches(
	chain: Vec<CertificateDer<'static>>,
	key: &PrivateKeyDer<'_>,
) -> Result<(), CredentialLoadError> {
	let signing_key = sign::any_supported_type(key)
		.map_err(|source| CredentialLoadError::InvalidPrivateKey { source })?;

	match CertifiedKey::new(chain, signing_key).keys_match() {
		Ok(()) | Err(TlsError::InconsistentKeys(InconsistentKeys::Unknown)) => Ok(()),
		Err(TlsError::InconsistentKeys(InconsistentKeys::KeyMismatch)) =>
			Err(CredentialLoadError::KeyMismatch),
		Err(e) => Err(CredentialLoadError::InvalidCertificate { reason: e.to_string() }),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::{fixture, fixture_bytes};

	#[test]
	fn fixture_pair_parses_with_future_expiry() {
		let material =
			CertificateMaterial::from_pem(&fixture_bytes("instance.crt"), &fixture_bytes("instance.key"))
				.expect("Fixture key pair should load.");

		assert!(material.not_after() > OffsetDateTime::now_utc() + Duration::days(365));
		assert!(material.subject().contains("credhub-client-test"));
		assert!(format!("{material:?}").contains("<redacted>"));
	}

	#[test]
	fn mismatched_key_is_rejected() {
		let err =
			CertificateMaterial::from_pem(&fixture_bytes("instance.crt"), &fixture_bytes("other.key"))
				.expect_err("Foreign key must not pair with the fixture certificate.");

		assert!(matches!(err, CredentialLoadError::KeyMismatch));
	}

	#[test]
	fn empty_or_malformed_material_is_rejected() {
		let err = CertificateMaterial::from_pem(b"", &fixture_bytes("instance.key"))
			.expect_err("Empty certificate material should fail.");

		assert!(matches!(err, CredentialLoadError::MissingCertificate));

		let err = CertificateMaterial::from_pem(&fixture_bytes("instance.crt"), b"")
			.expect_err("Empty key material should fail.");

		assert!(matches!(err, CredentialLoadError::MissingPrivateKey));

		let err =
			CertificateMaterial::from_pem(&fixture_bytes("malformed.crt"), &fixture_bytes("instance.key"))
				.expect_err("Garbage DER should fail to parse.");

		assert!(matches!(err, CredentialLoadError::InvalidCertificate { .. }));
	}

	#[test]
	fn file_source_reports_missing_files() {
		let source = FileCertificateSource::new(CertificatePaths::new(
			fixture("does-not-exist.crt"),
			fixture("instance.key"),
		));
		let err = source.load().expect_err("Missing certificate file should fail.");

		assert!(matches!(err, CredentialLoadError::Read { ref path, .. } if path.ends_with("does-not-exist.crt")));
	}

	#[test]
	fn env_source_fails_per_load_when_variables_are_unset() {
		let source = EnvCertificateSource::with_vars(
			"CREDHUB_CLIENT_UNSET_CERT_PATH",
			"CREDHUB_CLIENT_UNSET_KEY_PATH",
		);

		for _ in 0..2 {
			let err = source.load().expect_err("Unset variables should fail the load.");

			assert!(matches!(
				err,
				CredentialLoadError::MissingEnvironment { variable: "CREDHUB_CLIENT_UNSET_CERT_PATH" }
			));
		}
	}

	#[test]
	fn file_source_loads_fixture_pair() {
		let source =
			FileCertificateSource::new(CertificatePaths::new(fixture("instance.crt"), fixture("instance.key")));

		assert!(source.load().is_ok());
	}
}
