//! Integration tests for the extraction pipeline

#[cfg(test)]
mod tests {
    use crate::{
        heading, EscalationState, ExtractorError, Pipeline, PipelineConfig, PayloadKind,
        VERIFICATION_HEADING,
    };
    use takeoff_domain::{Confidence, ImageRef, Page, PageType, Project};
    use takeoff_llm::MockProvider;

    const SLD_ESTIMATED: &str = r#"{
        "building_block": "Main House",
        "distribution_boards": [{
            "name": "DB-GF", "confidence": "estimated", "main_breaker_a": 63,
            "circuits": [{"id": "L1", "type": "lighting", "num_points": 8, "confidence": "estimated"}]
        }]
    }"#;

    const SLD_EXTRACTED: &str = r#"{
        "building_block": "Main House",
        "distribution_boards": [{
            "name": "DB-GF", "confidence": "extracted", "main_breaker_a": 63,
            "circuits": [{"id": "L1", "type": "lighting", "num_points": 8, "confidence": "extracted"}]
        }]
    }"#;

    const LIGHTING: &str = r#"```json
    {
        "building_block": "Main House",
        "rooms": [{
            "name": "Kitchen", "confidence": "extracted",
            "fixtures": {"downlight_led_6w": 6},
            "circuit_refs": ["L1"],
        }]
    }
    ```"#;

    fn image_page(number: u32, page_type: PageType) -> Page {
        Page::new(
            number,
            page_type,
            Some(ImageRef::new("image/png", "aGVsbG8=")),
        )
    }

    fn project() -> Project {
        Project::with_blocks("Clubhouse", ["Main House"])
    }

    fn primary(sld: &str) -> MockProvider {
        let mut provider = MockProvider::default().with_usage(100, 0.5);
        provider.add_response(heading(PayloadKind::Sld), sld);
        provider.add_response(heading(PayloadKind::Lighting), LIGHTING);
        provider
    }

    #[test]
    fn test_full_extraction_flow() {
        let provider = primary(SLD_EXTRACTED);
        let pipeline = Pipeline::new(provider.clone(), PipelineConfig::default());
        let pages = vec![
            image_page(1, PageType::Sld),
            image_page(2, PageType::LayoutLighting),
        ];

        let run = pipeline.run(project(), &pages);

        assert!(run.warnings.is_empty(), "{:?}", run.warnings);
        assert_eq!(provider.call_count(), 2);
        assert_eq!(run.project.pages_processed, 2);
        assert_eq!(run.project.pages_with_data, 2);
        assert!(run.has_data());

        let block = run.project.block("main house").unwrap();
        let board = block.board("DB-GF").unwrap();
        assert_eq!(board.main_breaker_a.value, 63);
        assert_eq!(board.circuits.len(), 1);
        let kitchen = block.room("kitchen").unwrap();
        assert_eq!(kitchen.fixtures.get("downlight_led_6w"), 6);
        assert_eq!(kitchen.circuit_refs, vec!["L1"]);

        assert_eq!(run.merge_report.boards_created, 1);
        assert_eq!(run.merge_report.rooms_created, 1);
        assert_eq!(run.merge_report.blocks_created, 0);
        assert_eq!(run.model_used, "mock-vision");
        assert_eq!(run.tokens_used, 200);
        assert!((run.cost - 1.0).abs() < 1e-9);
        assert!(!run.escalation.attempted());
    }

    #[test]
    fn test_failed_kind_does_not_stop_others() {
        let mut provider = primary(SLD_EXTRACTED);
        provider.add_error(heading(PayloadKind::Plugs));
        let pipeline = Pipeline::new(provider.clone(), PipelineConfig::default());
        let pages = vec![
            image_page(1, PageType::Sld),
            image_page(2, PageType::LayoutLighting),
            image_page(3, PageType::LayoutPlugs),
        ];

        let run = pipeline.run(project(), &pages);

        assert_eq!(provider.call_count(), 3);
        assert_eq!(run.warnings.len(), 1);
        assert!(run.warnings[0].starts_with("plugs extraction failed"));
        let block = run.project.block("Main House").unwrap();
        assert!(block.board("DB-GF").is_some());
        assert!(block.room("Kitchen").is_some());
        assert_eq!(run.project.pages_processed, 3);
        assert_eq!(run.project.pages_with_data, 2);
        // failed call costs nothing
        assert_eq!(run.tokens_used, 200);
    }

    #[test]
    fn test_unreadable_response_is_a_warning() {
        let mut provider = MockProvider::default();
        provider.add_response(heading(PayloadKind::Sld), SLD_EXTRACTED);
        provider.add_response(
            heading(PayloadKind::Lighting),
            "Sorry, I cannot read this drawing.",
        );
        let pipeline = Pipeline::new(provider, PipelineConfig::default());
        let pages = vec![
            image_page(1, PageType::Sld),
            image_page(2, PageType::LayoutLighting),
        ];

        let run = pipeline.run(project(), &pages);

        assert_eq!(run.warnings.len(), 1);
        assert!(run.warnings[0].starts_with("lighting response could not be read"));
        assert_eq!(run.project.pages_with_data, 1);
        assert!(run.project.block("Main House").unwrap().rooms.is_empty());
    }

    #[test]
    fn test_register_and_unknown_pages_are_not_sent() {
        let provider = MockProvider::default();
        let pipeline = Pipeline::new(provider.clone(), PipelineConfig::default());
        let pages = vec![
            image_page(1, PageType::Register),
            image_page(2, PageType::Unknown),
        ];

        let run = pipeline.run(project(), &pages);

        assert_eq!(provider.call_count(), 0);
        assert_eq!(run.project.pages_processed, 2);
        assert_eq!(run.project.pages_with_data, 0);
        assert!(!run.has_data());
        assert_eq!(run.final_confidence.completeness, 0.0);
        assert!(run.warnings.is_empty());
    }

    #[test]
    fn test_image_limits_per_kind() {
        let provider = MockProvider::default();
        let pipeline = Pipeline::new(provider.clone(), PipelineConfig::default());
        let mut pages: Vec<Page> = (1..=7).map(|n| image_page(n, PageType::Sld)).collect();
        pages.extend((8..=11).map(|n| image_page(n, PageType::OutsideLights)));

        pipeline.run(project(), &pages);

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].prompt.contains(heading(PayloadKind::Sld)));
        assert_eq!(calls[0].image_count, 5);
        assert_eq!(calls[0].max_output_tokens, 8192);
        assert!(calls[1].prompt.contains(heading(PayloadKind::SiteInfra)));
        assert_eq!(calls[1].image_count, 3);
        assert_eq!(calls[1].max_output_tokens, 4096);
    }

    #[test]
    fn test_text_only_pages_are_sent_as_text() {
        let provider = MockProvider::default();
        let pipeline = Pipeline::new(provider.clone(), PipelineConfig::default());
        let mut page = Page::new(1, PageType::Sld, None);
        page.text = Some("DB-GF 63A MAIN SWITCH".to_string());
        let bare = Page::new(2, PageType::LayoutPlugs, None);

        let run = pipeline.run(project(), &[page, bare]);

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].image_count, 0);
        assert!(calls[0].prompt.contains("DB-GF 63A MAIN SWITCH"));
        assert_eq!(
            run.warnings,
            vec!["plugs pages carry no image or text; skipped".to_string()]
        );
    }

    #[test]
    fn test_failed_verification_keeps_pre_verification_graph() {
        let pages = vec![
            image_page(1, PageType::Sld),
            image_page(2, PageType::LayoutLighting),
        ];

        let unverified = Pipeline::new(primary(SLD_ESTIMATED), PipelineConfig::default())
            .run(project(), &pages);
        assert!(unverified.initial_confidence.overall < 0.80);
        assert!(!unverified.escalation.attempted());

        let verifier = MockProvider::new("The drawings look fine to me.")
            .with_model("mock-verifier")
            .with_usage(40, 0.2);
        let run = Pipeline::new(primary(SLD_ESTIMATED), PipelineConfig::default())
            .with_verifier(verifier.clone())
            .run(project(), &pages);

        assert_eq!(verifier.call_count(), 1);
        assert_eq!(run.project, unverified.project);
        assert_eq!(run.final_confidence, run.initial_confidence);
        assert_eq!(
            run.escalation.path,
            vec![
                EscalationState::Initial,
                EscalationState::Verifying,
                EscalationState::VerificationFailed,
                EscalationState::Settled,
            ]
        );
        let failures: Vec<&String> = run
            .warnings
            .iter()
            .filter(|w| w.starts_with("Verification failed"))
            .collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(run.warnings.len(), 1);
        assert_eq!(run.model_used, "mock-vision");
        // the failed attempt still spent tokens
        assert_eq!(run.tokens_used, 240);
    }

    #[test]
    fn test_verification_upgrades_low_confidence_graph() {
        let pages = vec![
            image_page(1, PageType::Sld),
            image_page(2, PageType::LayoutLighting),
        ];
        let mut verifier = MockProvider::default()
            .with_model("mock-verifier")
            .with_usage(50, 0.25);
        verifier.add_response(
            VERIFICATION_HEADING,
            format!(r#"{{"sld": {}, "unknown_section": 1}}"#, SLD_EXTRACTED),
        );

        let run = Pipeline::new(primary(SLD_ESTIMATED), PipelineConfig::default())
            .with_verifier(verifier.clone())
            .run(project(), &pages);

        let calls = verifier.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].prompt.contains("\"DB-GF\""));
        assert_eq!(calls[0].image_count, 2);
        assert_eq!(calls[0].max_output_tokens, 16384);

        assert!(run.escalation.verified());
        assert!(run.final_confidence.overall > run.initial_confidence.overall);
        assert_eq!(run.model_used, "mock-verifier");
        assert_eq!(run.tokens_used, 250);
        assert!((run.cost - 1.25).abs() < 1e-9);

        let board = run.project.block("Main House").unwrap().board("DB-GF").unwrap();
        assert_eq!(board.confidence, Confidence::Extracted);
        assert_eq!(board.circuits[0].confidence, Confidence::Extracted);
        assert_eq!(run.project.block("Main House").unwrap().distribution_boards.len(), 1);
    }

    #[test]
    fn test_escalation_disabled_never_calls_verifier() {
        let pages = vec![image_page(1, PageType::Sld)];
        let verifier = MockProvider::default();
        let config = PipelineConfig {
            escalation_enabled: false,
            ..Default::default()
        };

        let run = Pipeline::new(primary(SLD_ESTIMATED), config)
            .with_verifier(verifier.clone())
            .run(project(), &pages);

        assert_eq!(verifier.call_count(), 0);
        assert_eq!(run.escalation.final_state(), EscalationState::Settled);
        assert!(!run.escalation.attempted());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = PipelineConfig {
            max_pages_per_kind: 0,
            ..Default::default()
        };
        assert!(matches!(
            Pipeline::try_new(MockProvider::default(), config),
            Err(ExtractorError::Config(_))
        ));
        assert!(Pipeline::try_new(MockProvider::default(), PipelineConfig::default()).is_ok());
    }

    #[test]
    fn test_new_block_is_created_for_empty_project() {
        let mut provider = MockProvider::default();
        provider.add_response(
            heading(PayloadKind::Sld),
            r#"{"distribution_boards": [{"name": "DB-1", "confidence": "extracted"}]}"#,
        );
        let run = Pipeline::new(provider, PipelineConfig::default())
            .run(Project::new("Empty"), &[image_page(1, PageType::Sld)]);

        assert_eq!(run.project.building_blocks.len(), 1);
        assert_eq!(run.project.building_blocks[0].name, "Main Building");
        assert_eq!(run.merge_report.blocks_created, 1);
    }
}
