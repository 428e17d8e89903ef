//! Integration tests for single-document resolution.
//!
//! Covers decode policies, training-data generation and output shape.

mod common;

use common::{cluster_texts, document, pair_key_features, TableClassifier};
use corefchain::features::NULL_SENTINEL;
use corefchain::pairing::{HeadwordPairer, SentenceDistancePairer};
use corefchain::prelude::*;
use corefchain::CandidateGenerator;

fn resolver(config: ResolverConfig) -> MentionClusterResolver {
    MentionClusterResolver::new(config)
        .unwrap()
        .with_features(pair_key_features())
}

fn infer(config: ResolverConfig, doc: &Document, classifier: &TableClassifier) -> Resolution {
    resolver(config)
        .resolve_document(doc, &mut Mode::Inference { classifier })
        .unwrap()
}

// =============================================================================
// Scenario
// =============================================================================

#[test]
fn test_tumor_it_mass() {
    let doc = document("note", &[("the tumor", 1), ("it", 3), ("the mass", 23)]);
    let config = ResolverConfig::annotator();
    let generator = CandidateGenerator::empty()
        .with_strategy(SentenceDistancePairer::new(config.sentence_distance));
    let classifier = TableClassifier::new()
        .link("the tumor", "it", 0.9)
        .link("the tumor", "the mass", 0.9);

    let resolution = resolver(config)
        .with_candidates(generator)
        .resolve_document(&doc, &mut Mode::Inference { classifier: &classifier })
        .unwrap();

    // "the mass" is 20 sentences away and never proposed.
    assert_eq!(cluster_texts(&resolution), vec![vec!["the tumor", "it"]]);
    assert_eq!(resolution.edges.len(), 1);
    assert_eq!(resolution.edges[0].antecedent, MentionId::new(0, 0));
    assert_eq!(resolution.edges[0].anaphor, MentionId::new(0, 1));
}

// =============================================================================
// Decode policies
// =============================================================================

fn lesion_nodule_it() -> Document {
    document("note", &[("the lesion", 0), ("a nodule", 1), ("it", 2)])
}

#[test]
fn test_greedy_first_takes_first_positive_candidate() {
    let classifier = TableClassifier::new()
        .link("the lesion", "it", 0.9)
        .link("a nodule", "it", 0.6);
    let resolution = infer(ResolverConfig::annotator(), &lesion_nodule_it(), &classifier);

    // The nodule cluster is the most recent, so it is proposed first.
    assert_eq!(cluster_texts(&resolution), vec![vec!["a nodule", "it"]]);
    assert_eq!(resolution.edges[0].confidence, 0.6);
}

#[test]
fn test_best_first_takes_highest_score() {
    let classifier = TableClassifier::new()
        .link("the lesion", "it", 0.9)
        .link("a nodule", "it", 0.6);
    let config = ResolverConfig::annotator().with_decode(DecodePolicy::BestFirst);
    let resolution = infer(config, &lesion_nodule_it(), &classifier);

    assert_eq!(cluster_texts(&resolution), vec![vec!["the lesion", "it"]]);
    assert_eq!(resolution.edges[0].confidence, 0.9);
}

#[test]
fn test_best_first_equal_maxima_keep_first_encountered() {
    let classifier = TableClassifier::new()
        .link("the lesion", "it", 0.7)
        .link("a nodule", "it", 0.7);
    let config = ResolverConfig::annotator().with_decode(DecodePolicy::BestFirst);
    let resolution = infer(config, &lesion_nodule_it(), &classifier);

    assert_eq!(cluster_texts(&resolution), vec![vec!["a nodule", "it"]]);
}

#[test]
fn test_greedy_follows_strategy_registration_order() {
    let doc = Document::new("note", "the pain. a rash. pain").with_mentions(vec![
        Mention::new("the pain", 0, 8).with_head("pain", 4, 8).in_sentence(0),
        Mention::new("a rash", 10, 16).in_sentence(1),
        Mention::new("pain", 18, 22).with_head("pain", 18, 22).in_sentence(2),
    ]);
    let generator = CandidateGenerator::empty()
        .with_strategy(HeadwordPairer)
        .with_strategy(SentenceDistancePairer::new(5));
    let classifier = TableClassifier::new()
        .link("the pain", "pain", 0.5)
        .link("a rash", "pain", 0.95);

    let resolution = resolver(ResolverConfig::annotator())
        .with_candidates(generator)
        .resolve_document(&doc, &mut Mode::Inference { classifier: &classifier })
        .unwrap();

    // Headword is registered first, so its candidate wins despite the lower score.
    assert_eq!(cluster_texts(&resolution), vec![vec!["the pain", "pain"]]);
}

#[test]
fn test_section_match_outranks_older_cluster_in_window() {
    let doc = Document::new("note", "the lesion. a nodule. a rash. it").with_mentions(vec![
        Mention::new("the lesion", 0, 10).in_section(0).in_sentence(0),
        Mention::new("a nodule", 12, 20).in_section(1).in_sentence(20),
        Mention::new("a rash", 22, 28).in_section(1).in_sentence(21),
        Mention::new("it", 30, 32).in_section(0).in_sentence(22),
    ]);
    let classifier = TableClassifier::new()
        .link("the lesion", "it", 0.5)
        .link("a nodule", "it", 0.9);
    let resolution = infer(ResolverConfig::annotator(), &doc, &classifier);

    // Sentence distance only offers the rash cluster (negative); the section
    // header strategy offers the lesion before the cap reaches the nodule.
    assert_eq!(cluster_texts(&resolution), vec![vec!["the lesion", "it"]]);
}

#[test]
fn test_chain_order_is_discovery_order() {
    let doc = document(
        "note",
        &[("the mass", 0), ("a cyst", 1), ("it", 2), ("the cyst", 3), ("the lesion", 4)],
    );
    let classifier = TableClassifier::new()
        .link("the mass", "it", 0.8)
        .link("a cyst", "the cyst", 0.8)
        .link("the mass", "the lesion", 0.8);
    let resolution = infer(ResolverConfig::annotator(), &doc, &classifier);

    assert_eq!(
        cluster_texts(&resolution),
        vec![vec!["the mass", "it", "the lesion"], vec!["a cyst", "the cyst"]]
    );
    for cluster in &resolution.clusters {
        assert!(cluster.mentions.windows(2).all(|w| w[0].id < w[1].id));
    }
}

// =============================================================================
// Training
// =============================================================================

fn gold_for(patient: &Patient, chains: &[&[usize]]) -> GoldChains {
    let doc = &patient.documents()[0];
    let chains: Vec<_> = chains
        .iter()
        .map(|members| {
            let spans = members
                .iter()
                .map(|&i| {
                    let m = &doc.mentions()[i];
                    GoldSpan::new(0, m.begin, m.end)
                })
                .collect();
            GoldChain::new("Identity", spans)
        })
        .collect();
    GoldChains::align(patient, &chains).unwrap()
}

#[test]
fn test_keep_probability_one_writes_every_negative() {
    let patient = Patient::from(document("note", &[("the tumor", 1), ("it", 3), ("the mass", 23)]));
    let gold = GoldChains::default();
    let mut writer = MemoryDataWriter::new();
    let resolution = MentionClusterResolver::new(ResolverConfig::data_writer(1.0))
        .unwrap()
        .resolve(
            &patient,
            &mut Mode::Training {
                writer: &mut writer,
                gold: &gold,
            },
        )
        .unwrap();

    // "it" sees one singleton, "the mass" sees two.
    assert_eq!(writer.negatives(), 3);
    assert_eq!(resolution.examples_written, 3);
    assert!(resolution.clusters.is_empty());
}

#[test]
fn test_keep_probability_zero_writes_only_positives() {
    let patient = Patient::from(document("note", &[("the tumor", 1), ("it", 3), ("the mass", 23)]));
    let gold = gold_for(&patient, &[&[0, 1, 2]]);
    let mut writer = MemoryDataWriter::new();
    let resolution = MentionClusterResolver::new(ResolverConfig::data_writer(0.0))
        .unwrap()
        .resolve(
            &patient,
            &mut Mode::Training {
                writer: &mut writer,
                gold: &gold,
            },
        )
        .unwrap();

    assert_eq!(writer.negatives(), 0);
    assert_eq!(writer.label_counts().get("Identity"), Some(&2));
    // Gold links are followed, so all three end up in one chain.
    assert_eq!(
        cluster_texts(&resolution),
        vec![vec!["the tumor", "it", "the mass"]]
    );
    assert!(resolution.edges.iter().all(|e| e.confidence == 1.0));
}

#[test]
fn test_first_positive_stops_the_candidate_loop() {
    let patient = Patient::from(document("note", &[("the fever", 0), ("a cough", 1), ("it", 2)]));
    let gold = gold_for(&patient, &[&[1, 2]]);
    let mut writer = MemoryDataWriter::new();
    MentionClusterResolver::new(ResolverConfig::data_writer(1.0))
        .unwrap()
        .resolve(
            &patient,
            &mut Mode::Training {
                writer: &mut writer,
                gold: &gold,
            },
        )
        .unwrap();

    // "a cough" vs fever: negative. "it" vs cough: positive, then stop before fever.
    let labels: Vec<_> = writer.examples().iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, vec![NO_RELATION, "Identity"]);
}

#[test]
fn test_training_examples_never_carry_null_values() {
    let patient = Patient::from(document("note", &[("the tumor", 1), ("it", 3)]));
    let gold = GoldChains::default();
    let mut writer = MemoryDataWriter::new();
    MentionClusterResolver::new(ResolverConfig::data_writer(1.0))
        .unwrap()
        .resolve(
            &patient,
            &mut Mode::Training {
                writer: &mut writer,
                gold: &gold,
            },
        )
        .unwrap();

    let example = &writer.examples()[0];
    assert!(example.features.iter().all(|f| f.value.is_present()));
    let section = example
        .features
        .iter()
        .find(|f| f.name == "mention_section")
        .unwrap();
    assert_eq!(section.value, FeatureValue::Text(NULL_SENTINEL.to_string()));
}

#[test]
fn test_writer_is_shared_across_resolvers() {
    let first = Patient::from(document("a", &[("the tumor", 1), ("it", 3)]));
    let second = Patient::from(document("b", &[("a rash", 1), ("the rash", 2)]));
    let gold = GoldChains::default();
    let mut writer = MemoryDataWriter::new();

    for patient in [&first, &second] {
        let mut resolver = MentionClusterResolver::new(ResolverConfig::data_writer(1.0)).unwrap();
        resolver
            .resolve(
                patient,
                &mut Mode::Training {
                    writer: &mut writer,
                    gold: &gold,
                },
            )
            .unwrap();
    }
    assert_eq!(writer.len(), 2);
}

// =============================================================================
// Output
// =============================================================================

#[test]
fn test_resolution_serializes() {
    let classifier = TableClassifier::new().link("the lesion", "it", 0.9);
    let resolution = infer(ResolverConfig::annotator(), &lesion_nodule_it(), &classifier);
    let json = serde_json::to_value(&resolution).unwrap();

    assert_eq!(json["clusters"][0]["category"], "Identity");
    assert_eq!(json["edges"][0]["confidence"], 0.9);
    assert_eq!(json["entities"][0]["kind"], "Event");
    assert_eq!(json["examples_written"], 0);
}
