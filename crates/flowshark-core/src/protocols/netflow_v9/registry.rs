use std::collections::HashMap;
use std::sync::Arc;

use super::model::TemplateFlowSet;

// Lives for one decode pass; templates never carry over to the next datagram.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<u16, Arc<TemplateFlowSet>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, template: Arc<TemplateFlowSet>) {
        self.templates.insert(template.template_id(), template);
    }

    pub fn resolve(&self, template_id: u16) -> Option<Arc<TemplateFlowSet>> {
        self.templates.get(&template_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::TemplateRegistry;
    use crate::protocols::netflow_v9::model::TemplateFlowSet;

    #[test]
    fn resolves_registered_templates_only() {
        let mut registry = TemplateRegistry::new();
        assert!(registry.resolve(256).is_none());

        registry.register(Arc::new(TemplateFlowSet::new(0, 256, [(8, 4)])));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve(256).unwrap().template_id(), 256);
        assert!(registry.resolve(257).is_none());
    }

    #[test]
    fn later_template_replaces_earlier_one() {
        let mut registry = TemplateRegistry::new();
        registry.register(Arc::new(TemplateFlowSet::new(0, 256, [(8, 4)])));
        registry.register(Arc::new(TemplateFlowSet::new(0, 256, [(8, 4), (12, 4)])));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve(256).unwrap().fields().len(), 2);
    }
}
