//! Aggregate views over trial volumes. Every function returns a new value.

use crate::error::{ErrpError, Result};
use crate::volume::TrialVolume;
use ndarray::{Array, Array2, Axis, Dimension, RemoveAxis};

/// Common average reference: subtract the cross-channel mean from every
/// sample of every trial
pub fn car_filter(volume: &TrialVolume) -> TrialVolume {
    let mut data = volume.data().clone();
    if volume.num_channels() > 0 {
        // (trial, sample) means, broadcast back over the channel axis
        if let Some(mean) = volume.data().mean_axis(Axis(1)) {
            for mut channel in data.axis_iter_mut(Axis(1)) {
                channel -= &mean;
            }
        }
    }
    volume.replace_data(data)
}

/// Mean over trials, shaped (channel, sample)
pub fn grand_average(volume: &TrialVolume) -> Result<Array2<f64>> {
    volume
        .data()
        .mean_axis(Axis(0))
        .ok_or(ErrpError::EmptyVolume)
}

/// Population variance (ddof 0) over trials, shaped (channel, sample)
pub fn grand_variance(volume: &TrialVolume) -> Result<Array2<f64>> {
    if volume.is_empty() {
        return Err(ErrpError::EmptyVolume);
    }
    Ok(volume.data().var_axis(Axis(0), 0.0))
}

/// Element-wise `sqrt(x^2)`
pub fn magnitude<D: Dimension>(data: &Array<f64, D>) -> Array<f64, D> {
    data.mapv(|x| (x * x).sqrt())
}

/// Adds `value * i` to every element at index `i` of the first axis, so
/// stacked channel traces do not overlap when plotted
pub fn add_offset<D: RemoveAxis>(data: &Array<f64, D>, value: f64) -> Array<f64, D> {
    let mut shifted = data.clone();
    for (i, mut lane) in shifted.axis_iter_mut(Axis(0)).enumerate() {
        lane += value * i as f64;
    }
    shifted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorLabel;
    use ndarray::{array, Array3};

    fn volume(data: Array3<f64>) -> TrialVolume {
        let (trials, channels, _) = data.dim();
        let names = (0..channels).map(|c| format!("ch{}", c)).collect();
        TrialVolume::new(data, names, 100.0, 0, vec![0.0; trials], ErrorLabel::Error).unwrap()
    }

    #[test]
    fn test_car_zero_channel_mean() {
        let data = Array3::from_shape_fn((3, 4, 5), |(t, c, s)| (t * 7 + c * c * 3 + s) as f64);
        let filtered = car_filter(&volume(data));
        let channel_mean = filtered.data().mean_axis(Axis(1)).unwrap();
        assert!(channel_mean.iter().all(|m| m.abs() < 1e-12));
        assert_eq!(filtered.data().dim(), (3, 4, 5));
    }

    #[test]
    fn test_car_twice_equals_once() {
        let data = Array3::from_shape_fn((2, 3, 6), |(t, c, s)| {
            5.0 + (t + 1) as f64 * (c as f64 * 1.7 + (s as f64 * 0.9).sin())
        });
        let input = volume(data);
        assert!(input
            .data()
            .mean_axis(Axis(1))
            .unwrap()
            .iter()
            .any(|m| m.abs() > 1.0));

        let once = car_filter(&input);
        let twice = car_filter(&once);
        for (a, b) in once.data().iter().zip(twice.data().iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_car_does_not_modify_input() {
        let data = Array3::from_elem((1, 2, 3), 1.0);
        let original = volume(data);
        let _ = car_filter(&original);
        assert_eq!(original.data().sum(), 6.0);
    }

    #[test]
    fn test_grand_average_and_variance() {
        let mut data = Array3::zeros((2, 1, 2));
        data[[0, 0, 0]] = 1.0;
        data[[1, 0, 0]] = 3.0;
        data[[0, 0, 1]] = -2.0;
        data[[1, 0, 1]] = -2.0;
        let v = volume(data);

        assert_eq!(grand_average(&v).unwrap(), array![[2.0, -2.0]]);
        assert_eq!(grand_variance(&v).unwrap(), array![[1.0, 0.0]]);
    }

    #[test]
    fn test_statistics_on_empty_volume() {
        let empty = volume(Array3::zeros((0, 2, 4)));
        assert!(matches!(grand_average(&empty), Err(ErrpError::EmptyVolume)));
        assert!(matches!(grand_variance(&empty), Err(ErrpError::EmptyVolume)));
    }

    #[test]
    fn test_magnitude_any_dimension() {
        assert_eq!(magnitude(&array![-2.0, 3.0]), array![2.0, 3.0]);
        assert_eq!(
            magnitude(&array![[[-1.5]], [[0.0]]]),
            array![[[1.5]], [[0.0]]]
        );
    }

    #[test]
    fn test_add_offset_ramp() {
        let averaged = Array2::<f64>::zeros((3, 2));
        let shifted = add_offset(&averaged, 1e-6);
        assert_eq!(shifted.row(0).to_vec(), vec![0.0, 0.0]);
        assert_eq!(shifted.row(2).to_vec(), vec![2e-6, 2e-6]);
        assert_eq!(averaged.sum(), 0.0);
    }
}
