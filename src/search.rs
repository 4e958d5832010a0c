//! Client for the remote search API and the reformatting of its replies.
//!
//! The remote endpoint takes a compressed signature as the POST body and
//! answers with CSV, one row per matching dataset. Columns are not fixed by
//! this crate: whatever header the remote sends is carried through in order.

use std::time::Duration;

use log::{debug, info};
use reqwest::header::CONTENT_TYPE;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::cmd::serialize_sketch;
use crate::signature::Signature;
use crate::{Error, Result};

/// One row of the search reply, as (column, value) pairs in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    fields: Vec<(String, String)>,
}

impl SearchResult {
    /// A repeated column keeps its first position and its last value.
    fn from_record(headers: &csv::StringRecord, record: &csv::StringRecord) -> SearchResult {
        let mut fields: Vec<(String, String)> = Vec::with_capacity(headers.len());
        for (k, v) in headers.iter().zip(record.iter()) {
            match fields.iter_mut().find(|(column, _)| column.as_str() == k) {
                Some((_, value)) => *value = v.to_string(),
                None => fields.push((k.to_string(), v.to_string())),
            }
        }
        SearchResult { fields }
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v.as_str())
    }
}

impl Serialize for SearchResult {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Parse a CSV reply. The first row names the columns; an empty reply has
/// no matches.
pub fn parse_results(text: &str) -> Result<Vec<SearchResult>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();

    rdr.records()
        .map(|record| Ok(SearchResult::from_record(&headers, &record?)))
        .collect()
}

pub fn results_to_json(results: &[SearchResult]) -> Result<String> {
    Ok(serde_json::to_string(results)?)
}

#[derive(Debug, Clone)]
pub struct SearchClient {
    client: reqwest::Client,
    url: String,
}

impl SearchClient {
    pub fn new<S: Into<String>>(url: S, timeout: Option<Duration>) -> Result<SearchClient> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| Error::Internal {
            message: e.to_string(),
        })?;

        Ok(SearchClient {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST a serialized sketch and return the raw reply.
    ///
    /// Connection failures and non-success statuses are both
    /// [`Error::Upstream`].
    pub async fn search(&self, body: Vec<u8>) -> Result<String> {
        debug!("posting {} bytes to {}", body.len(), self.url);

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }

    /// Serialize, search and parse in one go.
    pub async fn query(&self, sigs: &[Signature]) -> Result<Vec<SearchResult>> {
        let body = serialize_sketch(sigs)?;
        let text = self.search(body).await?;
        let results = parse_results(&text)?;
        info!("Number of matches: {}", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const REPLY: &str = "SRA accession,containment,query_name\n\
                         SRR606249,0.95,genome.fa\n\
                         ERR1234567,0.12,genome.fa\n";

    #[test]
    fn parse_keeps_rows_and_columns() {
        let results = parse_results(REPLY).unwrap();
        assert_eq!(results.len(), 2);

        let columns: Vec<_> = results[0].columns().collect();
        assert_eq!(columns, vec!["SRA accession", "containment", "query_name"]);
        assert_eq!(results[0].get("SRA accession"), Some("SRR606249"));
        assert_eq!(results[1].get("containment"), Some("0.12"));
        assert_eq!(results[1].get("missing"), None);
    }

    #[test]
    fn json_preserves_column_order() {
        let results = parse_results("z,a,m\n1,2,3\n").unwrap();
        assert_eq!(
            results_to_json(&results).unwrap(),
            r#"[{"z":"1","a":"2","m":"3"}]"#
        );
    }

    #[test]
    fn empty_reply_has_no_matches() {
        assert!(parse_results("").unwrap().is_empty());
        assert!(parse_results("a,b\n").unwrap().is_empty());
        assert_eq!(results_to_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn quoted_fields() {
        let results = parse_results("name,score\n\"E. coli, K-12\",0.5\n").unwrap();
        assert_eq!(results[0].get("name"), Some("E. coli, K-12"));
    }

    #[test]
    fn repeated_column_keeps_last_value() {
        let results = parse_results("a,b,a\n1,2,3\n").unwrap();
        assert_eq!(results[0].fields().len(), 2);
        assert_eq!(results[0].get("a"), Some("3"));
        assert_eq!(
            results_to_json(&results).unwrap(),
            r#"[{"a":"3","b":"2"}]"#
        );
    }

    #[test]
    fn ragged_rows_are_malformed() {
        match parse_results("a,b\n1,2,3\n") {
            Err(Error::MalformedResults(_)) => (),
            other => panic!("expected MalformedResults, got {:?}", other),
        }
    }
}
