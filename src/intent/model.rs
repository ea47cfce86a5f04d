// Intent model - one classified query turn and the ordered turn history

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::{LocationResult, PlaceDetails, PlaceSummary, RecommendedPlace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentType {
    PlaceLookup,
    GeneralSearch,
    LocationOnly,
    AutocompleteSearch,
    AutocompleteTastes,
}

impl IntentType {
    /// Analytics event emitted when this kind of turn is dispatched
    pub fn event_name(&self) -> &'static str {
        match self {
            IntentType::PlaceLookup => "searchIntentWithPlace",
            IntentType::GeneralSearch => "searchIntentWithSearch",
            IntentType::LocationOnly => "searchIntentWithLocation",
            IntentType::AutocompleteSearch => "searchIntentWithAutocompleteSearch",
            IntentType::AutocompleteTastes => "searchIntentWithAutocompleteTastes",
        }
    }
}

/// Richer classifier output, when a classifier produces one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub search_type: Option<String>,
    pub categories: Vec<String>,
    pub tastes: Vec<String>,
    pub price_range: Option<(u8, u8)>,
    pub place_name: Option<String>,
    pub location_phrase: Option<String>,
    pub confidence: f64,
}

/// Results gathered while serving an intent; the only mutable part of a recorded turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fulfillment {
    pub selected_place: Option<PlaceSummary>,
    pub selected_details: Option<PlaceDetails>,
    pub places: Vec<PlaceSummary>,
    pub details: Vec<PlaceDetails>,
    pub recommended: Vec<RecommendedPlace>,
    pub related: Vec<RecommendedPlace>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    id: Uuid,
    caption: String,
    kind: IntentType,
    classification: Option<Classification>,
    destination: LocationResult,
    parameters: Map<String, Value>,
    pub fulfillment: Fulfillment,
}

impl Intent {
    pub fn new(
        caption: impl Into<String>,
        kind: IntentType,
        destination: LocationResult,
        parameters: Map<String, Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            caption: caption.into(),
            kind,
            classification: None,
            destination,
            parameters,
            fulfillment: Fulfillment::default(),
        }
    }

    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = Some(classification);
        self
    }

    pub fn with_selected_place(mut self, place: PlaceSummary) -> Self {
        self.fulfillment.selected_place = Some(place);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn kind(&self) -> IntentType {
        self.kind
    }

    pub fn classification(&self) -> Option<&Classification> {
        self.classification.as_ref()
    }

    pub fn destination(&self) -> &LocationResult {
        &self.destination
    }

    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    /// Same caption and destination as another turn
    pub fn is_same_turn(&self, caption: &str, destination: &LocationResult) -> bool {
        self.caption == caption && self.destination.id == destination.id
    }

    /// Fulfillment is complete for this intent's type
    pub fn is_terminal(&self) -> bool {
        let f = &self.fulfillment;
        match self.kind {
            IntentType::PlaceLookup => f.selected_place.is_some() && f.selected_details.is_some(),
            IntentType::GeneralSearch => !f.places.is_empty() || !f.recommended.is_empty(),
            IntentType::AutocompleteSearch => !f.places.is_empty() || !f.recommended.is_empty(),
            IntentType::LocationOnly | IntentType::AutocompleteTastes => true,
        }
    }
}

impl PartialEq for Intent {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Ordered turn history, owned by the orchestrator
#[derive(Debug, Clone, Default)]
pub struct IntentHistory {
    intents: Vec<Intent>,
}

impl IntentHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `intent`, or fold it into the last turn when caption and destination match.
    ///
    /// A folded turn keeps its id and fulfillment and takes the new type,
    /// classification and parameters. Returns the id of the recorded turn.
    pub fn record(&mut self, intent: Intent) -> Uuid {
        if let Some(last) = self.intents.last_mut() {
            if last.is_same_turn(&intent.caption, &intent.destination) {
                last.kind = intent.kind;
                last.classification = intent.classification;
                last.parameters = intent.parameters;
                if intent.fulfillment.selected_place.is_some() {
                    last.fulfillment.selected_place = intent.fulfillment.selected_place;
                }
                log::debug!("Updated intent {} in place", last.id);
                return last.id;
            }
        }

        let id = intent.id;
        self.intents.push(intent);
        id
    }

    pub fn last(&self) -> Option<&Intent> {
        self.intents.last()
    }

    pub fn get(&self, id: Uuid) -> Option<&Intent> {
        self.intents.iter().find(|i| i.id == id)
    }

    /// Fulfillment of the turn with `id`
    pub fn fulfillment_mut(&mut self, id: Uuid) -> Option<&mut Fulfillment> {
        self.intents
            .iter_mut()
            .find(|i| i.id == id)
            .map(|i| &mut i.fulfillment)
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Intent> {
        self.intents.iter()
    }

    pub fn clear(&mut self) {
        self.intents.clear();
    }
}
