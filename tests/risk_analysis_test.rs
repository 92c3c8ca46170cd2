use serde_json::json;
use student_risk::config::AnalysisConfig;
use student_risk::data::load_students;
use student_risk::{AnalysisMethod, RiskAnalyzer, RiskStatus, Student};

fn student(id: &str, gpa: f64, attendance: f64) -> Student {
    Student::new(id, id, gpa, attendance)
}

fn separated_cohort() -> Vec<Student> {
    vec![
        student("safe-1", 3.9, 98.0),
        student("high-1", 1.5, 60.0),
        student("mod-1", 3.0, 88.0),
        student("safe-2", 3.8, 97.0),
        student("high-2", 1.6, 62.0),
        student("mod-2", 2.9, 87.0),
        student("safe-3", 3.85, 96.0),
        student("high-3", 1.4, 58.0),
        student("mod-3", 3.1, 89.0),
    ]
}

#[test]
fn test_separated_groups_get_matching_tiers() {
    let analysis = RiskAnalyzer::default().analyze(&separated_cohort()).unwrap();

    assert_eq!(analysis.method, AnalysisMethod::Clustering);
    for enriched in &analysis.students {
        let expected = match enriched.student.id.split('-').next() {
            Some("safe") => RiskStatus::Safe,
            Some("mod") => RiskStatus::Moderate,
            _ => RiskStatus::High,
        };
        assert_eq!(enriched.risk_status, expected, "student {}", enriched.student.id);
    }
}

#[test]
fn test_output_preserves_input_order() {
    let cohort = separated_cohort();
    let analysis = RiskAnalyzer::default().analyze(&cohort).unwrap();

    let ids: Vec<&str> = analysis.students.iter().map(|s| s.student.id.as_str()).collect();
    let expected: Vec<&str> = cohort.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_stats_cover_every_student() {
    let analysis = RiskAnalyzer::default().analyze(&separated_cohort()).unwrap();

    assert_eq!(analysis.stats.len(), 3);
    let total: usize = analysis.stats.values().map(|s| s.average_score.count).sum();
    assert_eq!(total, 9);

    let high = &analysis.stats[&RiskStatus::High];
    assert!((high.average_score.mean - 1.5).abs() < 1e-9);
    assert_eq!(high.absence.min, 38.0);
    assert_eq!(high.absence.max, 42.0);
}

#[test]
fn test_risk_score_orders_groups() {
    let analysis = RiskAnalyzer::default().analyze(&separated_cohort()).unwrap();
    let score = |id: &str| {
        analysis
            .students
            .iter()
            .find(|s| s.student.id == id)
            .map(|s| s.risk_score)
            .unwrap()
    };

    assert!(score("high-1") > score("mod-1"));
    assert!(score("mod-1") > score("safe-1"));
}

#[test]
fn test_analysis_is_deterministic() {
    let analyzer = RiskAnalyzer::default();
    let first = analyzer.analyze(&separated_cohort()).unwrap();
    let second = analyzer.analyze(&separated_cohort()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_small_cohort_uses_thresholds() {
    let cohort = vec![student("a", 3.5, 95.0), student("b", 1.9, 91.0)];
    let analysis = RiskAnalyzer::default().analyze(&cohort).unwrap();

    assert_eq!(analysis.method, AnalysisMethod::Heuristic);
    assert!(analysis.stats.is_empty());
    assert_eq!(analysis.students[0].risk_status, RiskStatus::Safe);
    assert_eq!(analysis.students[1].risk_status, RiskStatus::High);
    assert!((analysis.students[0].risk_score - 0.175).abs() < 1e-9);
}

#[test]
fn test_identical_students_fall_back_with_stats() {
    let cohort: Vec<Student> = (0..4).map(|i| student(&format!("s{}", i), 3.5, 95.0)).collect();
    let analysis = RiskAnalyzer::default().analyze(&cohort).unwrap();

    assert_eq!(analysis.method, AnalysisMethod::Heuristic);
    assert!(analysis.students.iter().all(|s| s.risk_status == RiskStatus::Safe));
    assert_eq!(analysis.stats[&RiskStatus::Safe].average_score.count, 4);
}

#[test]
fn test_larger_min_cohort_keeps_thresholds() {
    let config = AnalysisConfig {
        min_cohort_size: 20,
        ..AnalysisConfig::default()
    };
    let analysis = RiskAnalyzer::new(config).analyze(&separated_cohort()).unwrap();

    assert_eq!(analysis.method, AnalysisMethod::Heuristic);
    assert!(analysis.stats.is_empty());
}

#[test]
fn test_invalid_student_rejects_cohort() {
    let mut cohort = separated_cohort();
    cohort.push(student("broken", 3.0, f64::INFINITY));

    let err = RiskAnalyzer::default().analyze(&cohort).unwrap_err();
    assert!(err.to_string().contains("broken"));
}

#[test]
fn test_extra_fields_survive_enrichment() {
    let mut record = student("std-001", 3.75, 92.5);
    record.extra.insert("major".to_string(), json!("Teknik Informatika"));
    let mut cohort = separated_cohort();
    cohort.insert(0, record);

    let analysis = RiskAnalyzer::default().analyze(&cohort).unwrap();
    let value = serde_json::to_value(&analysis.students[0]).unwrap();

    assert_eq!(value["major"], json!("Teknik Informatika"));
    assert!(value["riskStatus"].is_string());
}

#[test]
fn test_sample_roster_extremes() {
    let roster = load_students("data/students.csv").unwrap();
    assert_eq!(roster.len(), 12);

    let analysis = RiskAnalyzer::default().analyze(&roster).unwrap();
    assert_eq!(analysis.method, AnalysisMethod::Clustering);
    assert_eq!(analysis.find("std-007").unwrap().risk_status, RiskStatus::High);
    assert_eq!(analysis.find("std-010").unwrap().risk_status, RiskStatus::Safe);

    let high = &analysis.stats[&RiskStatus::High];
    let safe = &analysis.stats[&RiskStatus::Safe];
    assert!(high.average_score.mean < safe.average_score.mean);
}
