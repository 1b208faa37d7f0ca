//! Offer manifest loading
//!
//! The manifest is the JSON form of an `OfferDescription` with two
//! file-backed conveniences resolved at load time: an inline artifact may
//! carry `valueFile` instead of `value`, and a contract rule may be
//! `{"file": "..."}` instead of an inline policy document. Relative paths
//! resolve against the manifest's own directory, so a manifest and its
//! payloads can move together.

use anyhow::{bail, Context};
use herald_core::{
    ApiCredential, ArtifactSpec, ContractWindow, PolicyDocument, RepresentationMeta, ResourceMeta,
};
use herald_graph::{
    CatalogSpec, ContractDescription, OfferDescription, RepresentationDescription,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Load an offer description from a manifest file, resolving any
/// file-backed payloads.
pub fn load_offer(path: &Path) -> anyhow::Result<OfferDescription> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading manifest {}", path.display()))?;
    let manifest: RawManifest = serde_json::from_str(&raw)
        .with_context(|| format!("parsing manifest {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    resolve(manifest, base)
}

/// Stamp a bearer credential on every remote artifact that has none.
/// Artifacts that already carry a credential keep it.
pub fn stamp_bearer_token(offer: &mut OfferDescription, token: &str) {
    for rep in &mut offer.representations {
        if let ArtifactSpec::Remote { credential, .. } = &mut rep.artifact {
            if credential.is_none() {
                *credential = Some(ApiCredential::authorization(format!("Bearer {token}")));
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    #[serde(default)]
    catalog: CatalogSpec,
    resource: ResourceMeta,
    representations: Vec<RawRepresentation>,
    #[serde(default)]
    contract: Option<RawContract>,
}

#[derive(Deserialize)]
struct RawRepresentation {
    #[serde(flatten)]
    meta: RepresentationMeta,
    artifact: RawArtifact,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawArtifact {
    #[serde(rename_all = "camelCase")]
    Inline {
        title: String,
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        value_file: Option<PathBuf>,
    },
    #[serde(rename_all = "camelCase")]
    Remote {
        title: String,
        access_url: String,
        #[serde(default)]
        credential: Option<ApiCredential>,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContract {
    #[serde(flatten)]
    window: ContractWindow,
    rules: Vec<RawPolicy>,
}

/// A rule is either an inline policy document or a pointer to one.
/// `{"file": ...}` with any extra key falls through to the inline form.
#[derive(Deserialize)]
#[serde(untagged, deny_unknown_fields)]
enum RawPolicy {
    File { file: PathBuf },
    Inline(PolicyDocument),
}

fn resolve(manifest: RawManifest, base: &Path) -> anyhow::Result<OfferDescription> {
    let mut representations = Vec::with_capacity(manifest.representations.len());
    for rep in manifest.representations {
        representations.push(RepresentationDescription::new(
            rep.meta,
            resolve_artifact(rep.artifact, base)?,
        ));
    }
    let contract = match manifest.contract {
        Some(contract) => {
            let mut rules = Vec::with_capacity(contract.rules.len());
            for rule in contract.rules {
                rules.push(resolve_policy(rule, base)?);
            }
            Some(ContractDescription::new(contract.window, rules))
        }
        None => None,
    };
    Ok(OfferDescription {
        catalog: manifest.catalog,
        resource: manifest.resource,
        representations,
        contract,
    })
}

fn resolve_artifact(artifact: RawArtifact, base: &Path) -> anyhow::Result<ArtifactSpec> {
    match artifact {
        RawArtifact::Inline {
            title,
            value,
            value_file,
        } => {
            let value = match (value, value_file) {
                (Some(value), None) => value,
                (None, Some(file)) => {
                    let path = base.join(&file);
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("reading artifact payload {}", path.display()))?
                }
                (Some(_), Some(_)) => bail!("artifact {title:?} has both value and valueFile"),
                (None, None) => bail!("artifact {title:?} has neither value nor valueFile"),
            };
            Ok(ArtifactSpec::inline(title, value))
        }
        RawArtifact::Remote {
            title,
            access_url,
            credential,
        } => Ok(ArtifactSpec::remote(title, access_url, credential)),
    }
}

fn resolve_policy(rule: RawPolicy, base: &Path) -> anyhow::Result<PolicyDocument> {
    match rule {
        RawPolicy::Inline(policy) => Ok(policy),
        RawPolicy::File { file } => {
            let path = base.join(&file);
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading policy document {}", path.display()))?;
            raw.parse()
                .with_context(|| format!("parsing policy document {}", path.display()))
        }
    }
}
