//! Topic-model diagnostics in long (tidy) DataFrame form.
//!
//! Topics are labelled `TP0`, `TP1`, ... so the frames line up with each other.

use ndarray::Array2;
use polars::prelude::*;

use super::{argmax_index, topic_name, TopicModel};
use crate::error::{CapabilityError, TransformError};
use crate::frame::string_values;

/// Pairwise cosine similarity between topic component vectors.
///
/// Columns: `topic`, `to_compare`, `topic_similarity`. Rows are grouped by
/// `to_compare`, each group listing every `topic`. A zero vector has similarity
/// 0 with everything.
pub fn topic_similarity(components: &Array2<f64>) -> Result<DataFrame, TransformError> {
    let k = components.nrows();
    let norms: Vec<f64> = components
        .rows()
        .into_iter()
        .map(|r| r.dot(&r).sqrt())
        .collect();

    let mut topic = Vec::with_capacity(k * k);
    let mut to_compare = Vec::with_capacity(k * k);
    let mut similarity = Vec::with_capacity(k * k);
    for j in 0..k {
        for i in 0..k {
            let denom = norms[i] * norms[j];
            let sim = if denom > 0.0 {
                components.row(i).dot(&components.row(j)) / denom
            } else {
                0.0
            };
            topic.push(topic_name(i));
            to_compare.push(topic_name(j));
            similarity.push(sim);
        }
    }
    Ok(df!(
        "topic" => topic,
        "to_compare" => to_compare,
        "topic_similarity" => similarity,
    )?)
}

/// Top-`top_n` terms per topic by component weight, heaviest first.
///
/// Columns: `topic`, `term`, `weight`. Equal weights keep vocabulary order.
pub fn token_weights(
    components: &Array2<f64>,
    vocabulary: &[String],
    top_n: usize,
) -> Result<DataFrame, TransformError> {
    if components.ncols() != vocabulary.len() {
        return Err(CapabilityError::ShapeMismatch {
            expected: format!("{} vocabulary columns", vocabulary.len()),
            actual: format!("{} columns", components.ncols()),
        }
        .into());
    }
    let mut topic = Vec::new();
    let mut term = Vec::new();
    let mut weight = Vec::new();
    for (k, row) in components.rows().into_iter().enumerate() {
        let mut order: Vec<usize> = (0..row.len()).collect();
        order.sort_by(|&a, &b| row[b].total_cmp(&row[a]));
        for &t in order.iter().take(top_n) {
            topic.push(topic_name(k));
            term.push(vocabulary[t].clone());
            weight.push(row[t]);
        }
    }
    Ok(df!("topic" => topic, "term" => term, "weight" => weight)?)
}

/// Mean latent score vector of the rows assigned (by arg-max) to each topic.
///
/// Columns: `topic` (arg-max index) then one `TP<i>` column per topic. Only
/// topics that win at least one row appear, in ascending index order. Rows
/// whose scores are all NaN are skipped.
pub fn center_components(latent: &Array2<f64>) -> Result<DataFrame, TransformError> {
    let k = latent.ncols();
    let mut sums = vec![vec![0.0; k]; k];
    let mut counts = vec![0usize; k];
    for row in latent.rows() {
        let Some(winner) = argmax_index(row) else {
            continue;
        };
        counts[winner] += 1;
        for (acc, v) in sums[winner].iter_mut().zip(row.iter()) {
            *acc += v;
        }
    }

    let present: Vec<usize> = (0..k).filter(|&t| counts[t] > 0).collect();
    let mut columns: Vec<Column> = Vec::with_capacity(k + 1);
    columns.push(Column::new(
        "topic".into(),
        present.iter().map(|&t| t as i64).collect::<Vec<i64>>(),
    ));
    for c in 0..k {
        let means: Vec<f64> = present
            .iter()
            .map(|&t| sums[t][c] / counts[t] as f64)
            .collect();
        columns.push(Column::new(topic_name(c).into(), means));
    }
    Ok(DataFrame::new(columns)?)
}

/// Score `column` of `df` with `model` and summarise the latent scores with
/// [`center_components`].
pub fn topic_centers(
    df: &DataFrame,
    column: &str,
    model: &dyn TopicModel,
) -> Result<DataFrame, TransformError> {
    let texts = string_values(df, column)?;
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let latent = model.transform(&refs)?;
    if latent.nrows() != texts.len() {
        return Err(CapabilityError::ShapeMismatch {
            expected: format!("{} rows", texts.len()),
            actual: format!("{} rows", latent.nrows()),
        }
        .into());
    }
    tracing::debug!(model = model.name(), rows = texts.len(), "scored topic centers");
    center_components(&latent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::TermTopicModel;
    use crate::error::SchemaError;
    use ndarray::array;

    #[test]
    fn similarity_is_long_and_symmetric() {
        let c = array![[1.0, 0.0], [1.0, 1.0], [0.0, 0.0]];
        let df = topic_similarity(&c).unwrap();
        assert_eq!(df.height(), 9);
        let sims = df.column("topic_similarity").unwrap().f64().unwrap().clone();
        // row 0: TP0 vs TP0
        assert!((sims.get(0).unwrap() - 1.0).abs() < 1e-12);
        // TP1 vs TP0 and TP0 vs TP1
        let expected = 1.0 / 2f64.sqrt();
        assert!((sims.get(1).unwrap() - expected).abs() < 1e-12);
        assert!((sims.get(3).unwrap() - expected).abs() < 1e-12);
        // zero vector
        assert_eq!(sims.get(2), Some(0.0));
    }

    #[test]
    fn token_weights_take_top_terms() {
        let c = array![[0.1, 0.5, 0.3], [0.9, 0.0, 0.9]];
        let vocab: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let df = token_weights(&c, &vocab, 2).unwrap();
        assert_eq!(df.height(), 4);
        let terms: Vec<&str> = df
            .column("term")
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(terms, vec!["b", "c", "a", "c"]);
    }

    #[test]
    fn token_weights_reject_vocab_mismatch() {
        let c = array![[0.1, 0.5]];
        assert!(token_weights(&c, &["a".to_string()], 1).is_err());
    }

    #[test]
    fn center_components_average_per_winner() {
        let latent = array![[0.8, 0.2], [0.6, 0.4], [0.1, 0.9]];
        let df = center_components(&latent).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.get_column_names().len(), 3);
        let tp0 = df.column("TP0").unwrap().f64().unwrap().clone();
        assert!((tp0.get(0).unwrap() - 0.7).abs() < 1e-12);
        assert!((tp0.get(1).unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn topic_centers_score_a_text_column() {
        let model = TermTopicModel::new(
            vec!["fed".into(), "oil".into()],
            array![[1.0, 0.0], [0.0, 1.0]],
        )
        .unwrap();
        let df = df!("theme_sub" => ["fed rates", "oil supply", "fed minutes"]).unwrap();
        let centers = topic_centers(&df, "theme_sub", &model).unwrap();
        assert_eq!(centers.height(), 2);
        let topics: Vec<i64> = centers
            .column("topic")
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(topics, vec![0, 1]);
    }

    #[test]
    fn topic_centers_need_the_text_column() {
        let model = TermTopicModel::new(vec!["fed".into()], array![[1.0]]).unwrap();
        let df = df!("headline" => ["fed"]).unwrap();
        assert!(matches!(
            topic_centers(&df, "theme_sub", &model),
            Err(TransformError::Schema(SchemaError::MissingColumn(c))) if c == "theme_sub"
        ));
    }
}
