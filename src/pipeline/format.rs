use crate::markdown::{escape_md_link, sanitize_heading};

use super::{Query, Record};

pub fn format_records(records: &[Record], query: &Query) -> String {
    let mut output = format!("# PubMed: {}\n\n", sanitize_heading(&query.to_term()));

    if records.is_empty() {
        output.push_str("No matching articles.\n");
        return output;
    }

    for (i, record) in records.iter().enumerate() {
        output.push_str(&format!(
            "## {}. [{}]({})\n\n",
            i + 1,
            escape_md_link(&sanitize_heading(&record.title)),
            escape_md_link(&record.url)
        ));
        output.push_str(&format!(
            "- **First author:** {}\n- **PMID:** {}\n\n",
            record.authors, record.pmid
        ));
        output.push_str(&format!("**AI summary:** {}\n\n", record.ai_summary));
        output.push_str("**Abstract (translated):**\n\n");
        output.push_str(&record.translated_abstract);
        output.push_str("\n\n");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pmid: &str, title: &str) -> Record {
        Record {
            pmid: pmid.into(),
            title: title.into(),
            authors: "Tanaka K".into(),
            url: format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/"),
            translated_abstract: "翻訳された抄録。".into(),
            ai_summary: "(summary failed)".into(),
        }
    }

    #[test]
    fn includes_each_record_in_order() {
        let query = Query::new(["diabetes", "insulin"]);
        let text = format_records(&[record("111", "First"), record("222", "Second")], &query);

        assert!(text.starts_with("# PubMed: (diabetes) OR (insulin)\n"));
        let first = text.find("## 1. [First](https://pubmed.ncbi.nlm.nih.gov/111/)");
        let second = text.find("## 2. [Second](https://pubmed.ncbi.nlm.nih.gov/222/)");
        assert!(first.is_some() && second.is_some() && first < second);
        assert!(text.contains("**AI summary:** (summary failed)"));
        assert!(text.contains("翻訳された抄録。"));
        assert!(text.contains("**First author:** Tanaka K"));
    }

    #[test]
    fn escapes_brackets_and_newlines_in_titles() {
        let query = Query::new(["x"]);
        let text = format_records(&[record("1", "Effect of [drug]\non (mice)")], &query);

        assert!(text.contains(r"[Effect of \[drug\] on \(mice\)]"));
    }

    #[test]
    fn empty_result_says_so() {
        let text = format_records(&[], &Query::new(["x"]));
        assert!(text.contains("No matching articles."));
    }
}
