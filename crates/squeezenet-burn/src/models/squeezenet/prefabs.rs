//! # `SqueezeNet` Model Prefabs

use crate::models::squeezenet::squeezenet_model::SqueezeNetBypassConfig;

/// Fire blocks per group for `SqueezeNet` v1.0 with simple bypass.
///
/// Entries are ``(squeeze_channels, bypass)``; bypass falls on
/// fire blocks 2, 4, 6 and 8.
pub const SQUEEZENET_BYPASS_GROUPS: [&[(usize, bool)]; 3] = [
    &[(16, false), (16, true), (32, false)],
    &[(32, true), (48, false), (48, true), (64, false)],
    &[(64, true)],
];

/// Build the stock `SqueezeNet` v1.0 bypass config.
///
/// 3-channel 224x224 input, 1000 classes, dropout 0.5.
pub fn squeezenet_bypass() -> SqueezeNetBypassConfig {
    SqueezeNetBypassConfig::new(
        SQUEEZENET_BYPASS_GROUPS
            .iter()
            .map(|group| group.iter().map(|&spec| spec.into()).collect())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::squeezenet::fire_group::FireGroupMeta;
    use crate::models::squeezenet::squeezenet_model::SqueezeNetBypass;
    use bimm_contracts::assert_shape_contract;
    use burn::backend::NdArray;
    use burn::prelude::Tensor;

    #[test]
    fn test_squeezenet_bypass_config() {
        let config = squeezenet_bypass();
        config.expect_valid();

        assert_eq!(config.dropout, 0.5);
        assert_eq!(config.in_channels, 3);
        assert_eq!(config.stem_channels, 96);
        assert_eq!(config.num_classes, 1000);

        let groups = config.group_configs();
        assert_eq!(groups.len(), 3);
        assert_eq!(
            groups.iter().map(|g| g.len()).collect::<Vec<_>>(),
            vec![3, 4, 1],
        );
        assert_eq!(
            groups.iter().map(|g| g.downsample()).collect::<Vec<_>>(),
            vec![true, true, false],
        );

        assert_eq!(groups[0].in_channels(), 96);
        assert_eq!(groups[0].out_channels(), 256);
        assert_eq!(groups[1].in_channels(), 256);
        assert_eq!(groups[1].out_channels(), 512);
        assert_eq!(groups[2].in_channels(), 512);
        assert_eq!(groups[2].out_channels(), 512);

        assert_eq!(config.feature_channels(), 512);
    }

    #[test]
    fn test_squeezenet_bypass_model() {
        type B = NdArray<f32>;
        let device = Default::default();

        // Stock groups at a reduced input resolution and class count.
        let config = squeezenet_bypass().with_num_classes(10);
        let model: SqueezeNetBypass<B> = config.init(&device);

        assert_eq!(model.in_channels(), 3);
        assert_eq!(model.num_classes(), 10);
        assert_eq!(model.groups.len(), 3);

        // 64 -> stem -> 15 -> pool -> 7 -> pool -> 3 -> last group (no pool).
        let input = Tensor::ones([1, 3, 64, 64], &device);
        let output = model.forward(input);

        assert_shape_contract!(
            ["batch", "num_classes"],
            &output,
            &[("batch", 1), ("num_classes", 10)],
        );
    }
}
