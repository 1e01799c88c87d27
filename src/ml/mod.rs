//! Hand landmark detection
//!
//! Runs a MediaPipe-compatible hand landmark model through ONNX Runtime.
//! Models come from the PINTO Model Zoo conversion of the MediaPipe hand
//! pipeline (`hand_landmark.onnx`, 224x224 RGB input).
//!
//! Detection is synchronous: the caller hands over a frame and gets the hands
//! back on the same thread.

use std::path::{Path, PathBuf};

use ndarray::Array4;
use thiserror::Error;

/// Landmarks per hand
pub const LANDMARK_COUNT: usize = 21;

/// Model file expected in the model directory
pub const HAND_LANDMARK_MODEL: &str = "hand_landmark.onnx";

/// Side length of the square model input
const LANDMARK_INPUT_SIZE: u32 = 224;

/// Errors from loading or running the detector
#[derive(Debug, Error)]
pub enum MlError {
    #[error("model not found: {0}")]
    ModelNotFound(String),
    #[error("onnx runtime error: {0}")]
    Runtime(String),
    #[error("unexpected model output: {0}")]
    BadOutput(String),
}

/// Hand landmark (normalized coordinates)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandLandmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Detected hand
#[derive(Clone, Debug, PartialEq)]
pub struct Hand {
    /// 21 landmarks
    pub landmarks: [HandLandmark; LANDMARK_COUNT],
    /// Hand presence score
    pub confidence: f32,
    /// Is right hand
    pub is_right: bool,
}

impl Default for Hand {
    fn default() -> Self {
        Self {
            landmarks: [HandLandmark::default(); LANDMARK_COUNT],
            confidence: 0.0,
            is_right: false,
        }
    }
}

/// Source of per-frame hand landmarks
pub trait HandDetector {
    /// Detect hands in an RGBA frame. Landmarks are normalized to the frame.
    fn detect(&mut self, rgba: &[u8], width: u32, height: u32) -> Result<Vec<Hand>, MlError>;

    /// Short name for the UI
    fn name(&self) -> &str;

    /// Whether this detector can ever report a hand
    fn is_active(&self) -> bool {
        true
    }
}

/// Detector used when no model could be loaded
#[derive(Debug, Default)]
pub struct NullHandDetector;

impl HandDetector for NullHandDetector {
    fn detect(&mut self, _rgba: &[u8], _width: u32, _height: u32) -> Result<Vec<Hand>, MlError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "disabled"
    }

    fn is_active(&self) -> bool {
        false
    }
}

/// ONNX Runtime hand landmark detector
pub struct OnnxHandDetector {
    session: ort::session::Session,
    min_confidence: f32,
}

impl OnnxHandDetector {
    /// Load the landmark model.
    ///
    /// `model_dir` overrides the directory search.
    pub fn new(model_dir: Option<&Path>, min_confidence: f32) -> Result<Self, MlError> {
        let model_dir = match model_dir {
            Some(dir) => dir.to_path_buf(),
            None => find_model_dir()?,
        };
        log::info!("Model directory: {:?}", model_dir);

        let model_path = model_dir.join(HAND_LANDMARK_MODEL);
        if !model_path.exists() {
            return Err(MlError::ModelNotFound(format!("{:?}", model_path)));
        }

        ort::init()
            .with_name("GestureCalculator")
            .commit()
            .map_err(|e| MlError::Runtime(format!("Failed to initialize ORT: {}", e)))?;

        let session = ort::session::Session::builder()
            .map_err(|e| MlError::Runtime(format!("Failed to create session builder: {}", e)))?
            .with_intra_threads(2)
            .map_err(|e| MlError::Runtime(format!("Failed to set threads: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| MlError::Runtime(format!("Failed to load hand landmark model: {}", e)))?;

        log::info!("Loaded hand landmark model from {:?}", model_path);

        Ok(Self {
            session,
            min_confidence: min_confidence.clamp(0.0, 1.0),
        })
    }
}

impl HandDetector for OnnxHandDetector {
    fn detect(&mut self, rgba: &[u8], width: u32, height: u32) -> Result<Vec<Hand>, MlError> {
        let size = LANDMARK_INPUT_SIZE;
        let input = preprocess_frame_nhwc(rgba, width, height, size, size);

        let input_array = Array4::from_shape_vec((1, size as usize, size as usize, 3), input)
            .map_err(|e| MlError::Runtime(format!("Failed to create input array: {}", e)))?;
        let input_tensor = ort::value::Tensor::from_array(input_array)
            .map_err(|e| MlError::Runtime(format!("Failed to create tensor: {}", e)))?;

        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .map_err(|e| MlError::Runtime(format!("Inference failed: {}", e)))?;

        // Outputs are told apart by size: 63 landmark values, then two scalars
        // (presence, handedness) in declaration order.
        let mut coords: Option<Vec<f32>> = None;
        let mut scalars: Vec<f32> = Vec::new();
        for (_name, value) in outputs.iter() {
            let (_shape, data) = value
                .try_extract_tensor::<f32>()
                .map_err(|e| MlError::BadOutput(format!("Failed to extract output: {}", e)))?;
            if data.len() == LANDMARK_COUNT * 3 {
                coords = Some(data.to_vec());
            } else if data.len() == 1 {
                scalars.push(data[0]);
            }
        }

        let coords = coords.ok_or_else(|| MlError::BadOutput("no landmark tensor".to_string()))?;
        let presence = scalars.first().copied().unwrap_or(0.0);
        let handedness = scalars.get(1).copied().unwrap_or(0.0);

        Ok(decode_landmarks(&coords, presence, handedness, size as f32, self.min_confidence)
            .into_iter()
            .collect())
    }

    fn name(&self) -> &str {
        "onnx hand landmark"
    }
}

/// Turn raw model output into a hand, or nothing if the presence score is too low.
///
/// `coords` holds x, y, z triples in model input pixels.
pub fn decode_landmarks(
    coords: &[f32],
    presence: f32,
    handedness: f32,
    input_size: f32,
    min_confidence: f32,
) -> Option<Hand> {
    if presence < min_confidence || coords.len() < LANDMARK_COUNT * 3 {
        return None;
    }

    let mut hand = Hand {
        confidence: presence,
        is_right: handedness >= 0.5,
        ..Hand::default()
    };
    for (landmark, xyz) in hand.landmarks.iter_mut().zip(coords.chunks_exact(3)) {
        *landmark = HandLandmark {
            x: (xyz[0] / input_size).clamp(0.0, 1.0),
            y: (xyz[1] / input_size).clamp(0.0, 1.0),
            z: xyz[2] / input_size,
        };
    }
    Some(hand)
}

/// Resize an RGBA frame to HWC float RGB in [0, 1]
fn preprocess_frame_nhwc(
    rgba: &[u8],
    width: u32,
    height: u32,
    target_width: u32,
    target_height: u32,
) -> Vec<f32> {
    let mut output = vec![0.0f32; (target_width * target_height * 3) as usize];

    let x_ratio = width as f32 / target_width as f32;
    let y_ratio = height as f32 / target_height as f32;

    for y in 0..target_height {
        for x in 0..target_width {
            let src_x = (x as f32 * x_ratio) as u32;
            let src_y = (y as f32 * y_ratio) as u32;
            let src_idx = ((src_y * width + src_x) * 4) as usize;

            if src_idx + 2 < rgba.len() {
                let out_idx = ((y * target_width + x) * 3) as usize;
                output[out_idx] = rgba[src_idx] as f32 / 255.0;
                output[out_idx + 1] = rgba[src_idx + 1] as f32 / 255.0;
                output[out_idx + 2] = rgba[src_idx + 2] as f32 / 255.0;
            }
        }
    }

    output
}

/// Find the models directory next to the executable or in the working directory
pub fn find_model_dir() -> Result<PathBuf, MlError> {
    if let Ok(exe_path) = std::env::current_exe() {
        // models/ beside the binary, or up to three levels up for target/{debug,release}
        for dir in exe_path.ancestors().skip(1).take(4) {
            let model_dir = dir.join("models");
            if model_dir.exists() {
                return Ok(model_dir);
            }
        }
    }

    let cwd = std::env::current_dir().map_err(|e| MlError::ModelNotFound(e.to_string()))?;
    let model_dir = cwd.join("models");
    if model_dir.exists() {
        return Ok(model_dir);
    }

    Err(MlError::ModelNotFound(
        "Models directory not found. Create a 'models' directory containing hand_landmark.onnx."
            .to_string(),
    ))
}

/// Load the ONNX detector, falling back to a detector that never sees hands
pub fn load_detector(model_dir: Option<&Path>, min_confidence: f32) -> Box<dyn HandDetector> {
    match OnnxHandDetector::new(model_dir, min_confidence) {
        Ok(detector) => Box::new(detector),
        Err(e) => {
            log::warn!("Hand tracking disabled: {}", e);
            Box::new(NullHandDetector)
        }
    }
}
