// ABOUTME: Fixed demo analysis served without calling the vision model
// ABOUTME: A known-good barbell bench press document used for offline use and testing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde_json::{json, Value};

/// Demo document in the model output shape
///
/// `id` and `createdAt` are left out so each response gets fresh values
/// from coercion.
#[must_use]
pub fn demo_fixture() -> Value {
    json!({
        "machine": {
            "name": "Barbell Bench Press",
            "confidence": 0.92,
            "muscles": {
                "primary": ["Pectoralis major"],
                "secondary": ["Anterior deltoids", "Triceps brachii"]
            }
        },
        "howItWorks": "A flat bench and barbell setup where you press the barbell from chest level to arm's length to train the chest, shoulders, and triceps.",
        "steps": [
            "Set the bar at a height where you can unrack with a slight elbow bend; load appropriate weight and add collars.",
            "Lie on the bench with eyes under the bar, feet planted, slight arch, and shoulder blades retracted.",
            "Grip the bar slightly wider than shoulder width; wrists straight and forearms vertical when the bar is on the chest.",
            "Unrack, bring the bar over mid\u{2011}chest, inhale and lower under control to lightly touch the lower chest/sternum.",
            "Drive the bar back up by pressing through the chest and triceps, exhaling as you pass the sticking point.",
            "Lock out without hyperextending elbows; re-rack by guiding the bar back to the hooks with control."
        ],
        "safetyRisks": [
            "Avoid flared elbows at 90\u{b0}; keep ~45\u{2013}70\u{b0} to protect shoulders.",
            "Do not bounce the bar off the chest; pause lightly before pressing.",
            "Use spotter or safety arms; never max alone.",
            "Keep feet planted; avoid lifting hips off the bench."
        ],
        "commonMistakes": [
            "Overly wide grip reducing range of motion.",
            "Letting wrists bend back excessively.",
            "Butt lifting off bench to cheat the rep.",
            "Bar path straight up/down instead of slight J\u{2011}curve toward shoulders."
        ],
        "alternatives": [
            "Dumbbell Bench Press",
            "Incline Barbell Bench Press",
            "Machine Chest Press",
            "Push\u{2011}ups"
        ],
        "quickCoach": "Set scapular retraction, light chest touch, and a controlled 2\u{2013}3s lower. Drive through the feet, keep wrists stacked, and elbows ~60\u{b0}."
    })
}
