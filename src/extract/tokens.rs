//! Token-stream extraction: a pluggable OCR engine plus local reading-order
//! reconstruction and field classification.

use async_trait::async_trait;

use crate::classify::FieldClassifier;
use crate::error::Result;
use crate::layout::{self, LayoutOptions};
use crate::model::{ExpectedFields, FieldExtraction, MatchHints, Token};

use super::FieldExtractor;

/// One recognized region from an OCR engine: parallel arrays of texts,
/// confidence scores, and bounding polygons.
#[derive(Debug, Clone, Default)]
pub struct RecognizedRegion {
    pub texts: Vec<String>,
    pub scores: Vec<f32>,
    pub polygons: Vec<[(f32, f32); 4]>,
}

impl RecognizedRegion {
    /// Zip the parallel arrays into tokens. Entries missing a score or
    /// polygon are dropped.
    pub fn tokens(&self) -> Vec<Token> {
        self.texts
            .iter()
            .zip(self.scores.iter())
            .zip(self.polygons.iter())
            .map(|((text, score), polygon)| Token::new(text.clone(), *score, *polygon))
            .collect()
    }
}

/// Full OCR output for one image.
#[derive(Debug, Clone)]
pub struct OcrOutput {
    /// Image width in pixels.
    pub width: f32,
    /// Image height in pixels.
    pub height: f32,
    /// Recognized regions.
    pub regions: Vec<RecognizedRegion>,
}

/// Boundary for a raw OCR engine.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize text tokens and their bounding polygons in an image.
    async fn recognize(&self, image: &[u8]) -> Result<OcrOutput>;
}

/// Field extractor over a token-stream OCR engine.
///
/// Runs the engine, reconstructs reading order (including two-label
/// splitting), and classifies fields. Token-stream extraction never
/// produces match hints; verification always runs the deterministic rules.
pub struct TokenStreamExtractor<E> {
    engine: E,
    layout: LayoutOptions,
    classifier: FieldClassifier,
}

impl<E> TokenStreamExtractor<E> {
    /// Wrap an OCR engine with default layout options.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            layout: LayoutOptions::default(),
            classifier: FieldClassifier::new(),
        }
    }

    /// Override the layout thresholds.
    pub fn with_layout_options(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }
}

#[async_trait]
impl<E: OcrEngine> FieldExtractor for TokenStreamExtractor<E> {
    async fn extract(&self, image: &[u8], _expected: &ExpectedFields) -> Result<FieldExtraction> {
        let output = self.engine.recognize(image).await?;

        let tokens: Vec<Token> = output
            .regions
            .iter()
            .flat_map(|region| region.tokens())
            .collect();

        let order = layout::reading_order(&tokens, output.width, output.height, &self.layout);
        log::debug!(
            "Reconstructed {} tokens into reading order (split: {})",
            order.texts.len(),
            order.split_x.is_some()
        );

        let fields = self.classifier.classify(&order.texts, &tokens, order.split_x);

        Ok(FieldExtraction {
            fields,
            hints: MatchHints::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEngine {
        output: OcrOutput,
    }

    #[async_trait]
    impl OcrEngine for FixedEngine {
        async fn recognize(&self, _image: &[u8]) -> Result<OcrOutput> {
            Ok(self.output.clone())
        }
    }

    fn rect(left: f32, top: f32, right: f32, bottom: f32) -> [(f32, f32); 4] {
        [(left, top), (right, top), (right, bottom), (left, bottom)]
    }

    #[tokio::test]
    async fn test_token_stream_extraction() {
        let region = RecognizedRegion {
            texts: vec![
                "OLD".into(),
                "CROW".into(),
                "STRAIGHT".into(),
                "RYE".into(),
                "WHISKY".into(),
                "45%".into(),
                "ALC/VOL".into(),
                "750".into(),
                "ML".into(),
            ],
            scores: vec![0.95; 9],
            polygons: vec![
                rect(100.0, 40.0, 220.0, 110.0),
                rect(240.0, 40.0, 400.0, 110.0),
                rect(100.0, 150.0, 250.0, 180.0),
                rect(260.0, 150.0, 320.0, 180.0),
                rect(330.0, 150.0, 460.0, 180.0),
                rect(100.0, 240.0, 180.0, 270.0),
                rect(190.0, 240.0, 320.0, 270.0),
                rect(100.0, 300.0, 160.0, 330.0),
                rect(170.0, 300.0, 220.0, 330.0),
            ],
        };
        let extractor = TokenStreamExtractor::new(FixedEngine {
            output: OcrOutput {
                width: 600.0,
                height: 400.0,
                regions: vec![region],
            },
        });

        let extraction = extractor
            .extract(b"image", &ExpectedFields::default())
            .await
            .unwrap();

        assert_eq!(extraction.fields.brand_name, "OLD CROW");
        assert_eq!(extraction.fields.class_type, "STRAIGHT RYE WHISKY");
        assert_eq!(extraction.fields.alcohol_content, "45% ALC/VOL");
        assert_eq!(extraction.fields.net_contents, "750 ML");
        assert_eq!(extraction.hints, MatchHints::default());
    }

    #[test]
    fn test_region_token_zip_drops_ragged_tail() {
        let region = RecognizedRegion {
            texts: vec!["A".into(), "B".into()],
            scores: vec![0.9],
            polygons: vec![rect(0.0, 0.0, 10.0, 10.0)],
        };
        assert_eq!(region.tokens().len(), 1);
    }
}
