use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

use examgrade_core::definition::{QuestionDefinition, QuestionType};
use examgrade_core::{evaluate, CaseStudyCreditPolicy, EvaluationPolicy, Evaluator};

fn case_study_question(sub_questions: usize) -> Value {
    let subs: Vec<Value> = (0..sub_questions)
        .map(|i| match i % 3 {
            0 => json!({"questionType": "single-choice", "correctAnswer": "opt1", "marks": 1}),
            1 => json!({"questionType": "multiple-choice", "correctAnswers": ["opt1", "opt2"], "marks": 2}),
            _ => json!({"questionType": "short-answer", "expectedAnswer": "photosynthesis"}),
        })
        .collect();
    json!({ "subQuestions": subs })
}

fn case_study_answer(sub_questions: usize) -> Value {
    Value::Array(
        (0..sub_questions)
            .map(|i| match i % 3 {
                0 => json!(0),
                1 => json!(["opt2", "opt1"]),
                _ => json!(" Photosynthesis "),
            })
            .collect(),
    )
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    let single = json!({"options": [
        {"id": "opt1", "text": "A", "isCorrect": false},
        {"id": "opt2", "text": "B", "isCorrect": true},
        {"id": "opt3", "text": "C", "isCorrect": false}
    ]});
    group.bench_function("single-choice", |b| {
        b.iter(|| evaluate(black_box("single-choice"), black_box(&single), black_box(&json!("opt2")), 5.0))
    });

    let drag = json!({"dragDropTargets": (0..20)
        .map(|i| json!({"id": format!("zone{i}"), "correctItemId": format!("item{i}")}))
        .collect::<Vec<_>>()});
    let placements: serde_json::Map<String, Value> = (0..20)
        .map(|i| (format!("item{i}"), json!(format!("zone{i}"))))
        .collect();
    let placements = Value::Object(placements);
    group.bench_function("drag-drop/20", |b| {
        b.iter(|| evaluate(black_box("drag-drop"), black_box(&drag), black_box(&placements), 10.0))
    });

    let serialized = Value::String(single.to_string());
    group.bench_function("single-choice/serialized", |b| {
        b.iter(|| evaluate(black_box("single-choice"), black_box(&serialized), black_box(&json!(1)), 5.0))
    });

    group.finish();
}

fn bench_case_study(c: &mut Criterion) {
    let mut group = c.benchmark_group("case_study");
    let any = Evaluator::new(EvaluationPolicy {
        case_study_credit: CaseStudyCreditPolicy::Any,
        ..Default::default()
    });

    for size in [3usize, 30, 300] {
        let question = case_study_question(size);
        let answer = case_study_answer(size);
        group.bench_function(format!("raw/{size}"), |b| {
            b.iter(|| any.evaluate(black_box("case-study"), black_box(&question), black_box(&answer), 10.0))
        });

        let normalized = QuestionDefinition::from_value(QuestionType::CaseStudy, &question)
            .expect("bench question is valid");
        group.bench_function(format!("normalized/{size}"), |b| {
            b.iter(|| any.evaluate_definition(black_box(&normalized), black_box(&answer), 10.0))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dispatch, bench_case_study);
criterion_main!(benches);
