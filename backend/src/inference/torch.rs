use std::path::Path;
use std::sync::Mutex;

use tch::{CModule, Device, Kind, Tensor};

use super::{InferenceError, InputTensor, PanelModel, check_input_shape, lock_model};

impl From<tch::TchError> for InferenceError {
    fn from(err: tch::TchError) -> Self {
        InferenceError::Forward(err.to_string())
    }
}

/// TorchScript export of the dust classifier. Takes NHWC `f32` input and
/// returns a `[1, 1]` sigmoid output.
pub struct TorchModel {
    module: Mutex<CModule>,
    device: Device,
    input_size: (u32, u32),
}

impl TorchModel {
    pub fn load(path: &Path, input_size: (u32, u32)) -> Result<Self, InferenceError> {
        let device = Device::cuda_if_available();
        let mut module =
            CModule::load_on_device(path, device).map_err(|e| InferenceError::ModelLoad {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        module.set_eval();
        log::info!("Loaded TorchScript model {} on {:?}", path.display(), device);
        Ok(Self {
            module: Mutex::new(module),
            device,
            input_size,
        })
    }

    fn to_tensor(&self, input: &InputTensor) -> Result<Tensor, InferenceError> {
        let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
        let data = input
            .as_slice()
            .ok_or_else(|| InferenceError::Forward("input tensor is not contiguous".to_string()))?;
        Ok(Tensor::from_slice(data).view(shape.as_slice()).to_device(self.device))
    }
}

impl PanelModel for TorchModel {
    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }

    fn predict(&self, input: &InputTensor) -> Result<f32, InferenceError> {
        check_input_shape(input, self.input_size)?;
        let tensor = self.to_tensor(input)?;

        let output = {
            // forward_ts never mutates the module, so a poisoned lock is still usable.
            let module = lock_model(&self.module);
            tch::no_grad(|| module.forward_ts(&[tensor]))?
        };

        let flat = output.to_kind(Kind::Float).flatten(0, -1);
        if flat.numel() == 0 {
            return Err(InferenceError::EmptyOutput);
        }
        Ok(flat.f_double_value(&[0])? as f32)
    }
}
