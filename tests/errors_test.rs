#[cfg(test)]
mod error_tests {
    use crabhdr::errors::FusionError;
    use std::error::Error;

    #[test]
    fn test_invalid_range_display() {
        let error = FusionError::InvalidRange { lower: 4, upper: -4 };
        let message = error.to_string();
        assert!(message.contains("4"));
        assert!(message.contains("-4"));
    }

    #[test]
    fn test_insufficient_frames_display() {
        let error = FusionError::InsufficientFrames {
            required: 2,
            provided: 1,
        };
        assert_eq!(error.to_string(), "Insufficient frames: need 2, got 1");
    }

    #[test]
    fn test_decode_failure_names_the_frame() {
        let error = FusionError::DecodeFailure {
            index: 3,
            reason: "truncated buffer".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains('3'));
        assert!(message.contains("truncated buffer"));
    }

    #[test]
    fn test_capture_error_display() {
        let error = FusionError::Capture {
            index: 2,
            reason: "device busy".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Capture failed at bracket step 2: device busy"
        );
    }

    #[test]
    fn test_error_debug_format() {
        let error = FusionError::InvalidConfig("Debug test".to_string());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("InvalidConfig"));
        assert!(debug_str.contains("Debug test"));
    }

    #[test]
    fn test_error_implements_error_trait() {
        let error = FusionError::Storage("Error trait test".to_string());
        let _error_trait: &dyn Error = &error;
        assert!(error.source().is_none());
    }

    #[test]
    fn test_all_error_variants() {
        let errors = vec![
            FusionError::InvalidRange { lower: 1, upper: 0 },
            FusionError::InsufficientFrames {
                required: 2,
                provided: 0,
            },
            FusionError::DecodeFailure {
                index: 0,
                reason: "decode".to_string(),
            },
            FusionError::GeometryMismatchUnrecoverable {
                index: 1,
                reason: "zero area".to_string(),
            },
            FusionError::ChannelLayoutMismatch {
                index: 1,
                expected: 3,
                got: 4,
            },
            FusionError::InvalidConfig("config".to_string()),
            FusionError::Capture {
                index: 0,
                reason: "capture".to_string(),
            },
            FusionError::Worker("worker".to_string()),
            FusionError::Storage("storage".to_string()),
        ];

        for error in errors {
            assert!(!error.to_string().is_empty());
            assert!(!format!("{:?}", error).is_empty());
        }
    }

    #[test]
    fn test_error_serializes_for_frontends() {
        let error = FusionError::ChannelLayoutMismatch {
            index: 2,
            expected: 3,
            got: 1,
        };
        let json = serde_json::to_string(&error).unwrap();
        let back: FusionError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, error);
    }

    #[test]
    fn test_error_converts_into_anyhow() {
        fn fails() -> anyhow::Result<()> {
            Err(FusionError::Worker("join failed".to_string()).into())
        }
        let error = fails().unwrap_err();
        assert!(error.to_string().contains("join failed"));
        assert!(error.downcast_ref::<FusionError>().is_some());
    }
}
