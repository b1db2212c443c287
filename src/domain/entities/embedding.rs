use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, Result};

/// Per-token embeddings of one text: a row-major `[tokens, dimension]` matrix.
///
/// Values are kept exactly as the encoder produced them. Nothing here
/// normalizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f32>>", into = "Vec<Vec<f32>>")]
pub struct TokenEmbeddings {
    data: Vec<f32>,
    dimension: usize,
}

impl TokenEmbeddings {
    /// Builds the matrix from one vector per token.
    ///
    /// All rows must share the same non-zero length. An empty row list is
    /// accepted and yields a zero-token matrix of dimension 0; scoring rejects
    /// it later.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let dimension = rows.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 && !rows.is_empty() {
            return Err(DomainError::validation("token 0 has dimension 0"));
        }

        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != dimension)
        {
            return Err(DomainError::validation(format!(
                "token {} has dimension {}, expected {}",
                index,
                row.len(),
                dimension
            )));
        }

        let data = rows.into_iter().flatten().collect();
        Ok(Self { data, dimension })
    }

    /// Wraps an already flattened matrix. `data.len()` must be a multiple of
    /// `dimension`.
    pub fn from_flat(data: Vec<f32>, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            if !data.is_empty() {
                return Err(DomainError::validation(
                    "non-empty token data with zero dimension",
                ));
            }
        } else if data.len() % dimension != 0 {
            return Err(DomainError::validation(format!(
                "{} values do not split into tokens of dimension {}",
                data.len(),
                dimension
            )));
        }
        Ok(Self { data, dimension })
    }

    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            dimension: 0,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn num_tokens(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_tokens() == 0
    }

    pub fn token(&self, index: usize) -> Option<&[f32]> {
        if index >= self.num_tokens() {
            return None;
        }
        let start = index * self.dimension;
        self.data.get(start..start + self.dimension)
    }

    pub fn tokens(&self) -> impl ExactSizeIterator<Item = &[f32]> + '_ {
        // chunks_exact panics on a zero chunk size
        self.data.chunks_exact(self.dimension.max(1))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

impl TryFrom<Vec<Vec<f32>>> for TokenEmbeddings {
    type Error = DomainError;

    fn try_from(rows: Vec<Vec<f32>>) -> Result<Self> {
        Self::from_rows(rows)
    }
}

impl From<TokenEmbeddings> for Vec<Vec<f32>> {
    fn from(embeddings: TokenEmbeddings) -> Self {
        embeddings.tokens().map(<[f32]>::to_vec).collect()
    }
}

/// Token embeddings of one query, tagged with the query identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryEmbedding {
    pub id: String,
    pub embeddings: TokenEmbeddings,
}

impl QueryEmbedding {
    pub fn new(id: impl Into<String>, embeddings: TokenEmbeddings) -> Self {
        Self {
            id: id.into(),
            embeddings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_shape() {
        let emb = TokenEmbeddings::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]])
            .unwrap();

        assert_eq!(emb.num_tokens(), 3);
        assert_eq!(emb.dimension(), 2);
        assert_eq!(emb.token(1), Some(&[3.0, 4.0][..]));
        assert_eq!(emb.token(3), None);
        assert_eq!(emb.tokens().count(), 3);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = TokenEmbeddings::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_from_rows_rejects_zero_width_tokens() {
        let err = TokenEmbeddings::from_rows(vec![vec![]]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(TokenEmbeddings::from_rows(vec![vec![], vec![]]).is_err());
        assert!(serde_json::from_str::<TokenEmbeddings>("[[]]").is_err());
    }

    #[test]
    fn test_empty_rows() {
        let emb = TokenEmbeddings::from_rows(vec![]).unwrap();
        assert!(emb.is_empty());
        assert_eq!(emb.tokens().count(), 0);
        assert_eq!(emb, TokenEmbeddings::empty());
    }

    #[test]
    fn test_from_flat() {
        let emb = TokenEmbeddings::from_flat(vec![0.0; 12], 4).unwrap();
        assert_eq!(emb.num_tokens(), 3);
        assert!(TokenEmbeddings::from_flat(vec![0.0; 10], 4).is_err());
        assert!(TokenEmbeddings::from_flat(vec![1.0], 0).is_err());
    }

    #[test]
    fn test_deserialize_nested_arrays() {
        let emb: TokenEmbeddings = serde_json::from_str("[[1.0, 0.0], [0.0, 1.0]]").unwrap();
        assert_eq!(emb.num_tokens(), 2);

        let ragged = serde_json::from_str::<TokenEmbeddings>("[[1.0, 0.0], [0.0]]");
        assert!(ragged.is_err());

        let json = serde_json::to_value(&emb).unwrap();
        assert_eq!(json, serde_json::json!([[1.0, 0.0], [0.0, 1.0]]));
    }
}
