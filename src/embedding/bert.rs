use candle_core::{DType, Device, Result, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use std::path::Path;

/// Sentence-encoder wrapper around a BERT-family transformer.
///
/// Loads safetensors weights from a model directory and exposes the raw
/// token-level hidden states; pooling happens in the embedder.
pub struct SentenceBert {
    model: BertModel,
    hidden_size: usize,
}

impl SentenceBert {
    pub fn load<P: AsRef<Path>>(
        config_path: P,
        weights_path: P,
        device: &Device,
    ) -> Result<Self> {
        let config_content = std::fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| candle_core::Error::Msg(format!("Failed to parse config: {}", e)))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path.as_ref()], DType::F32, device)?
        };

        let model = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            BertModel::load(vb.pp("bert"), &config)?
        } else {
            BertModel::load(vb, &config)?
        };

        Ok(Self {
            model,
            hidden_size: config.hidden_size,
        })
    }

    /// Runs the transformer; returns hidden states of shape `[1, seq, hidden]`.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        self.model.forward(input_ids, token_type_ids, attention_mask)
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }
}
