//! BEIR-style retrieval datasets: `corpus.jsonl`, `queries.jsonl`, and
//! `qrels/<split>.tsv`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CorpusLine {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryLine {
    #[serde(rename = "_id")]
    id: String,
    text: String,
}

/// Loaded dataset; maps preserve file order.
#[derive(Debug, Default)]
pub struct Dataset {
    pub corpus: IndexMap<String, String>,
    pub queries: IndexMap<String, String>,
    pub qrels: IndexMap<String, Vec<String>>,
}

impl Dataset {
    pub fn load(dir: &Path, split: &str) -> Result<Self> {
        let corpus = load_corpus(&dir.join("corpus.jsonl"))?;
        let queries = load_queries(&dir.join("queries.jsonl"))?;
        let qrels = load_qrels(&dir.join("qrels").join(format!("{split}.tsv")))?;
        tracing::info!(
            docs = corpus.len(),
            queries = queries.len(),
            judged = qrels.len(),
            "dataset loaded"
        );
        Ok(Self {
            corpus,
            queries,
            qrels,
        })
    }

    /// Keep only the first `max_docs` corpus entries.
    pub fn truncate_corpus(&mut self, max_docs: usize) {
        self.corpus.truncate(max_docs);
    }

    pub fn truncate_queries(&mut self, max_queries: usize) {
        self.queries.truncate(max_queries);
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

/// Document text, falling back to the title when the body is empty.
pub fn load_corpus(path: &Path) -> Result<IndexMap<String, String>> {
    let mut corpus = IndexMap::new();
    for (lineno, line) in open(path)?.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: CorpusLine = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", path.display(), lineno + 1))?;
        let text = doc
            .text
            .filter(|t| !t.is_empty())
            .or(doc.title)
            .unwrap_or_default();
        corpus.insert(doc.id, text);
    }
    Ok(corpus)
}

pub fn load_queries(path: &Path) -> Result<IndexMap<String, String>> {
    let mut queries = IndexMap::new();
    for (lineno, line) in open(path)?.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let query: QueryLine = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", path.display(), lineno + 1))?;
        queries.insert(query.id, query.text);
    }
    Ok(queries)
}

/// `query-id<TAB>corpus-id[<TAB>score]`; the first line is a header.
pub fn load_qrels(path: &Path) -> Result<IndexMap<String, Vec<String>>> {
    let mut qrels: IndexMap<String, Vec<String>> = IndexMap::new();
    for line in open(path)?.lines().skip(1) {
        let line = line?;
        let mut parts = line.trim().split('\t');
        if let (Some(query_id), Some(doc_id)) = (parts.next(), parts.next()) {
            qrels
                .entry(query_id.to_string())
                .or_default()
                .push(doc_id.to_string());
        }
    }
    Ok(qrels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_beir_layout() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join("corpus.jsonl"),
            concat!(
                r#"{"_id": "1", "text": "what is rust", "title": ""}"#,
                "\n",
                r#"{"_id": "2", "text": "", "title": "borrow checker"}"#,
                "\n\n",
            ),
        )?;
        fs::write(
            dir.path().join("queries.jsonl"),
            r#"{"_id": "q1", "text": "rust language"}"#,
        )?;
        fs::create_dir(dir.path().join("qrels"))?;
        fs::write(
            dir.path().join("qrels").join("dev.tsv"),
            "query-id\tcorpus-id\tscore\nq1\t1\t1\nq1\t2\t1\nbad-line\n",
        )?;

        let ds = Dataset::load(dir.path(), "dev")?;
        assert_eq!(ds.corpus.len(), 2);
        assert_eq!(ds.corpus["2"], "borrow checker");
        assert_eq!(ds.queries["q1"], "rust language");
        assert_eq!(ds.qrels["q1"], vec!["1".to_string(), "2".to_string()]);
        Ok(())
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = Dataset::load(dir.path(), "dev").unwrap_err();
        assert!(err.to_string().contains("corpus.jsonl"));
    }
}
