// MATLAB v5 behavior logs: a 2-row state matrix and an action vector.

use super::BehaviorReader;
use crate::behavior::BehaviorRecord;
use crate::error::{ErrpError, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use matfile::{MatFile, NumericData};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

const MI_INT8: u32 = 1;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
const MX_DOUBLE_CLASS: u32 = 6;

/// Names of the variables holding the state matrix and the action vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatVariables {
    pub states: String,
    pub actions: String,
}

impl Default for MatVariables {
    fn default() -> Self {
        Self {
            states: "states".to_string(),
            actions: "actions".to_string(),
        }
    }
}

pub struct MatBehaviorReader {
    path: PathBuf,
    variables: MatVariables,
}

impl MatBehaviorReader {
    pub fn new<P: AsRef<Path>>(path: P, variables: MatVariables) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            variables,
        }
    }

    fn to_f64(data: &NumericData) -> Vec<f64> {
        match data {
            NumericData::Double { real, .. } => real.clone(),
            NumericData::Single { real, .. } => real.iter().map(|&v| v as f64).collect(),
            NumericData::Int8 { real, .. } => real.iter().map(|&v| v as f64).collect(),
            NumericData::Int16 { real, .. } => real.iter().map(|&v| v as f64).collect(),
            NumericData::Int32 { real, .. } => real.iter().map(|&v| v as f64).collect(),
            NumericData::Int64 { real, .. } => real.iter().map(|&v| v as f64).collect(),
            NumericData::UInt8 { real, .. } => real.iter().map(|&v| v as f64).collect(),
            NumericData::UInt16 { real, .. } => real.iter().map(|&v| v as f64).collect(),
            NumericData::UInt32 { real, .. } => real.iter().map(|&v| v as f64).collect(),
            NumericData::UInt64 { real, .. } => real.iter().map(|&v| v as f64).collect(),
        }
    }

    fn to_codes(name: &str, values: Vec<f64>) -> Result<Vec<i64>> {
        values
            .into_iter()
            .map(|v| {
                if v.is_finite() {
                    Ok(v.round() as i64)
                } else {
                    Err(ErrpError::Mat(format!(
                        "Variable '{}' contains a non-finite value",
                        name
                    )))
                }
            })
            .collect()
    }

    fn variable<'a>(mat: &'a MatFile, name: &str) -> Result<&'a matfile::Array> {
        mat.find_by_name(name)
            .ok_or_else(|| ErrpError::Mat(format!("Variable '{}' not found", name)))
    }

    /// MATLAB stores column-major; the state matrix may be saved as 2xN or Nx2.
    fn states_matrix(name: &str, size: &[usize], values: Vec<i64>) -> Result<Array2<i64>> {
        let (rows, cols) = match size {
            [rows, cols] => (*rows, *cols),
            other => {
                return Err(ErrpError::Mat(format!(
                    "Variable '{}' must be a matrix, got dimensions {:?}",
                    name, other
                )))
            }
        };
        if values.len() < rows * cols {
            return Err(ErrpError::Mat(format!(
                "Variable '{}' holds {} values for a {}x{} matrix",
                name,
                values.len(),
                rows,
                cols
            )));
        }

        if rows == 2 {
            Ok(Array2::from_shape_fn((2, cols), |(r, c)| values[c * rows + r]))
        } else if cols == 2 {
            log::debug!("Transposing {}x2 state matrix '{}'", rows, name);
            Ok(Array2::from_shape_fn((2, rows), |(r, c)| values[r * rows + c]))
        } else {
            Err(ErrpError::Mat(format!(
                "Variable '{}' must have two rows (intended, actual), got {}x{}",
                name, rows, cols
            )))
        }
    }
}

impl BehaviorReader for MatBehaviorReader {
    fn read_behavior(&self) -> Result<BehaviorRecord> {
        if !self.path.exists() {
            return Err(ErrpError::FileNotFound(self.path.display().to_string()));
        }
        let file = File::open(&self.path)?;
        let mat = MatFile::parse(file).map_err(|e| {
            ErrpError::Mat(format!("Failed to parse {}: {:?}", self.path.display(), e))
        })?;

        let states_name = &self.variables.states;
        let states_array = Self::variable(&mat, states_name)?;
        let state_codes = Self::to_codes(states_name, Self::to_f64(states_array.data()))?;
        let states = Self::states_matrix(states_name, states_array.size(), state_codes)?;

        let actions_name = &self.variables.actions;
        let actions_array = Self::variable(&mat, actions_name)?;
        let actions = Self::to_codes(actions_name, Self::to_f64(actions_array.data()))?;

        log::debug!(
            "Behavior log {}: {} state columns, {} actions",
            self.path.display(),
            states.ncols(),
            actions.len()
        );

        BehaviorRecord::new(states, actions)
    }

    fn format_name(&self) -> &str {
        "MAT"
    }
}

/// Writes a behavior record as an uncompressed MATLAB v5 file with two
/// double variables: the 2xN state matrix and a 1xM action row vector.
pub struct MatBehaviorWriter {
    variables: MatVariables,
}

impl MatBehaviorWriter {
    pub fn new(variables: MatVariables) -> Self {
        Self { variables }
    }

    fn padded(len: usize) -> usize {
        len.div_ceil(8) * 8
    }

    fn matrix_element(
        out: &mut Vec<u8>,
        name: &str,
        rows: usize,
        cols: usize,
        column_major: &[f64],
    ) -> Result<()> {
        let name_bytes = name.as_bytes();
        let body_len = 16 // array flags
            + 16 // dimensions
            + 8 + Self::padded(name_bytes.len())
            + 8 + column_major.len() * 8;

        out.write_u32::<LittleEndian>(MI_MATRIX)?;
        out.write_u32::<LittleEndian>(body_len as u32)?;

        out.write_u32::<LittleEndian>(MI_UINT32)?;
        out.write_u32::<LittleEndian>(8)?;
        out.write_u32::<LittleEndian>(MX_DOUBLE_CLASS)?;
        out.write_u32::<LittleEndian>(0)?;

        out.write_u32::<LittleEndian>(MI_INT32)?;
        out.write_u32::<LittleEndian>(8)?;
        out.write_i32::<LittleEndian>(rows as i32)?;
        out.write_i32::<LittleEndian>(cols as i32)?;

        out.write_u32::<LittleEndian>(MI_INT8)?;
        out.write_u32::<LittleEndian>(name_bytes.len() as u32)?;
        out.extend_from_slice(name_bytes);
        out.resize(out.len() + Self::padded(name_bytes.len()) - name_bytes.len(), 0);

        out.write_u32::<LittleEndian>(MI_DOUBLE)?;
        out.write_u32::<LittleEndian>((column_major.len() * 8) as u32)?;
        for &value in column_major {
            out.write_f64::<LittleEndian>(value)?;
        }
        Ok(())
    }

    pub fn write<P: AsRef<Path>>(&self, path: P, behavior: &BehaviorRecord) -> Result<()> {
        let mut out = Vec::new();
        let mut text = b"MATLAB 5.0 MAT-file, written by errp-rs".to_vec();
        text.resize(116, b' ');
        out.extend_from_slice(&text);
        out.extend_from_slice(&[0u8; 8]);
        out.write_u16::<LittleEndian>(0x0100)?;
        out.extend_from_slice(b"IM");

        let states = behavior.states();
        let column_major: Vec<f64> = states.t().iter().map(|&v| v as f64).collect();
        Self::matrix_element(
            &mut out,
            &self.variables.states,
            2,
            states.ncols(),
            &column_major,
        )?;

        let actions: Vec<f64> = behavior.actions().iter().map(|&v| v as f64).collect();
        Self::matrix_element(&mut out, &self.variables.actions, 1, actions.len(), &actions)?;

        std::fs::write(path, out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.mat");
        let behavior =
            BehaviorRecord::from_rows(&[0, 1, 2, -1], &[0, 1, 1, 2], vec![1, 2, 1]).unwrap();
        MatBehaviorWriter::new(MatVariables::default())
            .write(&path, &behavior)
            .unwrap();

        let loaded = MatBehaviorReader::new(&path, MatVariables::default())
            .read_behavior()
            .unwrap();
        assert_eq!(loaded, behavior);
    }

    #[test]
    fn test_custom_variable_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.mat");
        let variables = MatVariables {
            states: "S".to_string(),
            actions: "intent".to_string(),
        };
        let behavior = BehaviorRecord::from_rows(&[0, 1], &[0, 2], vec![1]).unwrap();
        MatBehaviorWriter::new(variables.clone())
            .write(&path, &behavior)
            .unwrap();

        let missing = MatBehaviorReader::new(&path, MatVariables::default()).read_behavior();
        assert!(matches!(missing, Err(ErrpError::Mat(_))));

        let loaded = MatBehaviorReader::new(&path, variables).read_behavior().unwrap();
        assert_eq!(loaded.actions(), &[1]);
    }

    #[test]
    fn test_states_transposed() {
        // 3x2 column-major: intended column then actual column
        let values = vec![0, 1, 2, 0, 2, 2];
        let states = MatBehaviorReader::states_matrix("states", &[3, 2], values).unwrap();
        assert_eq!(states.row(0).to_vec(), vec![0, 1, 2]);
        assert_eq!(states.row(1).to_vec(), vec![0, 2, 2]);
    }

    #[test]
    fn test_states_wrong_shape() {
        let result = MatBehaviorReader::states_matrix("states", &[3, 3], vec![0; 9]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file() {
        let reader = MatBehaviorReader::new("/nonexistent/run.mat", MatVariables::default());
        assert!(matches!(
            reader.read_behavior(),
            Err(ErrpError::FileNotFound(_))
        ));
    }
}
