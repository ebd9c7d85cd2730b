//! Live OncoKB annotation client.
//!
//! Blocking HTTP with a bounded timeout. Any failure surfaces as a
//! [`KbError`], which the aggregator treats as "no evidence from OncoKB".

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use oncotier_common::{
    ActionabilityContext, CancerMatch, KnowledgeSource, OncoKbLevel, OncoKbOncogenicity,
};
use oncotier_config::OncoKbApiConfig;

use crate::error::{KbError, Result};
use crate::provider::KnowledgeSourceProvider;
use crate::record::{Alteration, KbHit, KbQuery, KbRecord};

const SOURCE: KnowledgeSource = KnowledgeSource::OncoKb;

/// Subset of the `/annotate/mutations/byProteinChange` response we use.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationResponse {
    #[serde(default)]
    pub oncogenic: Option<String>,
    #[serde(default)]
    pub treatments: Vec<Treatment>,
    #[serde(default)]
    pub diagnostic_implications: Vec<Implication>,
    #[serde(default)]
    pub prognostic_implications: Vec<Implication>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Treatment {
    pub level: String,
    #[serde(default)]
    pub drugs: Vec<Drug>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drug {
    pub drug_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Implication {
    pub level_of_evidence: String,
}

pub struct OncoKbApiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    token: Option<String>,
    timeout_ms: u64,
}

impl OncoKbApiClient {
    pub fn new(config: &OncoKbApiConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.resolved_token(),
            timeout_ms: config.timeout_ms,
        })
    }

    fn map_http_error(&self, err: reqwest::Error) -> KbError {
        if err.is_timeout() {
            KbError::Timeout { kb: SOURCE, timeout_ms: self.timeout_ms }
        } else {
            KbError::Http(err)
        }
    }
}

impl KnowledgeSourceProvider for OncoKbApiClient {
    fn source(&self) -> KnowledgeSource {
        SOURCE
    }

    fn lookup(&self, query: &KbQuery) -> Result<Vec<KbHit>> {
        // The API resolves notation itself; gene-wide queries are not supported
        let alteration = match &query.alteration {
            Alteration::Exact(hgvs) => oncotier_common::normalise_protein_change(hgvs)
                .map(|pc| pc.short_form)
                .unwrap_or_else(|| hgvs.trim_start_matches("p.").to_string()),
            Alteration::ShortForm(short) => short.clone(),
            Alteration::Gene => return Ok(Vec::new()),
        };

        let url = format!("{}/annotate/mutations/byProteinChange", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .query(&[("hugoSymbol", query.gene.as_str()), ("alteration", alteration.as_str())]);
        if let Some(tumor_type) = &query.cancer_type {
            request = request.query(&[("tumorType", tumor_type.as_str())]);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(|e| self.map_http_error(e))?;
        let status = response.status();
        if !status.is_success() {
            warn!(gene = %query.gene, %alteration, %status, "OncoKB API returned an error status");
            return Err(KbError::Unavailable { kb: SOURCE, reason: format!("HTTP {}", status) });
        }
        let body: AnnotationResponse = response
            .json()
            .map_err(|e| KbError::Malformed { kb: SOURCE, reason: e.to_string() })?;
        let hits = annotation_hits(body, query);
        debug!(gene = %query.gene, %alteration, hits = hits.len(), "OncoKB API lookup");
        Ok(hits)
    }
}

/// Convert an annotation response into hits. Resistance levels are dropped.
pub fn annotation_hits(body: AnnotationResponse, query: &KbQuery) -> Vec<KbHit> {
    let cancer_match = if query.cancer_type.is_some() {
        CancerMatch::Specific
    } else {
        CancerMatch::PanCancer
    };
    let alteration = match &query.alteration {
        Alteration::Exact(a) | Alteration::ShortForm(a) => Some(a.clone()),
        Alteration::Gene => None,
    };
    let hit = |record: KbRecord| KbHit {
        source: SOURCE,
        alteration: alteration.clone(),
        cancer_types: query.cancer_type.iter().cloned().collect(),
        match_level: query.alteration.match_level(),
        cancer_match,
        record,
    };

    let mut hits = Vec::new();
    // Uncurated variants come back as "Unknown"; that is absence of evidence.
    let oncogenicity = body.oncogenic.as_deref().map(OncoKbOncogenicity::from_str).filter(|o| o.is_curated());
    if let Some(oncogenicity) = oncogenicity {
        hits.push(hit(KbRecord::OncoKb {
            level: None,
            context: ActionabilityContext::Therapeutic,
            therapies: Vec::new(),
            oncogenicity: Some(oncogenicity),
            fda_approved: false,
        }));
    }
    for treatment in body.treatments {
        let Some(level) = OncoKbLevel::from_str(&treatment.level) else { continue };
        hits.push(hit(KbRecord::OncoKb {
            level: Some(level),
            context: ActionabilityContext::Therapeutic,
            therapies: treatment.drugs.into_iter().map(|d| d.drug_name).collect(),
            oncogenicity: None,
            fda_approved: level == OncoKbLevel::Level1,
        }));
    }
    let implications = body
        .diagnostic_implications
        .into_iter()
        .map(|i| (ActionabilityContext::Diagnostic, i))
        .chain(body.prognostic_implications.into_iter().map(|i| (ActionabilityContext::Prognostic, i)));
    for (context, implication) in implications {
        let Some(level) = OncoKbLevel::from_str(&implication.level_of_evidence) else { continue };
        hits.push(hit(KbRecord::OncoKb {
            level: Some(level),
            context,
            therapies: Vec::new(),
            oncogenicity: None,
            fda_approved: false,
        }));
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRAF_RESPONSE: &str = r#"{
        "oncogenic": "Oncogenic",
        "treatments": [
            {"level": "LEVEL_1", "drugs": [{"drugName": "Dabrafenib"}, {"drugName": "Trametinib"}]},
            {"level": "LEVEL_R1", "drugs": [{"drugName": "Cetuximab"}]}
        ],
        "diagnosticImplications": [],
        "prognosticImplications": [{"levelOfEvidence": "LEVEL_Px1"}]
    }"#;

    #[test]
    fn test_annotation_hits_from_response() {
        let body: AnnotationResponse = serde_json::from_str(BRAF_RESPONSE).unwrap();
        let query = KbQuery::new("BRAF", Alteration::ShortForm("V600E".into()), Some("Melanoma"));
        let hits = annotation_hits(body, &query);
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.cancer_match == CancerMatch::Specific));
        match &hits[1].record {
            KbRecord::OncoKb { level, therapies, fda_approved, .. } => {
                assert_eq!(*level, Some(OncoKbLevel::Level1));
                assert_eq!(therapies.len(), 2);
                assert!(fda_approved);
            }
            other => panic!("unexpected record {:?}", other),
        }
        assert!(matches!(
            hits[2].record,
            KbRecord::OncoKb { context: ActionabilityContext::Prognostic, .. }
        ));
    }

    #[test]
    fn test_uncurated_variant_yields_no_hits() {
        let body: AnnotationResponse = serde_json::from_str(
            r#"{"oncogenic": "Unknown", "treatments": [], "diagnosticImplications": [], "prognosticImplications": []}"#,
        )
        .unwrap();
        let query = KbQuery::new("ZNF717", Alteration::ShortForm("Q400R".into()), Some("Melanoma"));
        assert!(annotation_hits(body, &query).is_empty());

        let body: AnnotationResponse =
            serde_json::from_str(r#"{"oncogenic": "Inconclusive", "treatments": []}"#).unwrap();
        assert!(annotation_hits(body, &query).is_empty());
    }

    #[test]
    fn test_gene_query_short_circuits() {
        let client = OncoKbApiClient::new(&OncoKbApiConfig {
            base_url: "http://127.0.0.1:9".into(),
            token: None,
            timeout_ms: 50,
        })
        .unwrap();
        let hits = client.lookup(&KbQuery::new("BRAF", Alteration::Gene, None)).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_unreachable_host_is_error_not_panic() {
        let client = OncoKbApiClient::new(&OncoKbApiConfig {
            base_url: "http://127.0.0.1:9".into(),
            token: Some("test".into()),
            timeout_ms: 200,
        })
        .unwrap();
        let result = client.lookup(&KbQuery::new("BRAF", Alteration::ShortForm("V600E".into()), None));
        assert!(result.is_err());
    }
}
