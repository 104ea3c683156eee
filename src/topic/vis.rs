use super::dictionary::Dictionary;
use super::TopicModel;
use std::fmt::Write as _;

const TERMS_PER_TOPIC: usize = 30;

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Self-contained HTML page: one panel per topic with its share of
/// documents and a bar per top term.
pub fn render_html<M: TopicModel + ?Sized>(model: &M, dictionary: &Dictionary, doc_counts: &[usize], title: &str) -> String {
    let total_docs: usize = doc_counts.iter().sum::<usize>().max(1);
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{t}</title>\n<style>\
         body{{font-family:sans-serif;margin:2em}}.topic{{display:inline-block;vertical-align:top;width:22em;margin:0 1em 1.5em 0}}\
         .bar{{background:#4682b4;height:0.9em;display:inline-block}}td{{padding:1px 4px;font-size:0.9em}}\
         </style></head><body>\n<h1>{t}</h1>\n",
        t = escape(title)
    );
    for topic in 0..model.num_topics() {
        let count = doc_counts.get(topic).copied().unwrap_or(0);
        let share = 100.0 * count as f64 / total_docs as f64;
        let terms = model.topic_terms(topic, TERMS_PER_TOPIC);
        let max_w = terms.first().map(|(_, w)| *w).unwrap_or(0.0).max(f64::MIN_POSITIVE);
        let _ = write!(html, "<div class=\"topic\"><h2>Topic {topic}</h2><p>{count} questions ({share:.1}%)</p><table>\n");
        for (id, w) in terms {
            let word = dictionary.token(id).unwrap_or("?");
            let width = (120.0 * w / max_w).round();
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td><span class=\"bar\" style=\"width:{width}px\"></span></td><td>{w:.4}</td></tr>",
                escape(word)
            );
        }
        html.push_str("</table></div>\n");
    }
    html.push_str("</body></html>\n");
    html
}
