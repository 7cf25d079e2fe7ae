use api_types::currency::{CurrencyTypeList, CurrencyTypeView};
use axum::{Json, extract::State};

use crate::{ServerError, server::ServerState};

/// List the registered currency types.
pub async fn list(State(state): State<ServerState>) -> Result<Json<CurrencyTypeList>, ServerError> {
    let currencies = state.deadline(state.engine.currency_types()).await?;

    Ok(Json(CurrencyTypeList {
        currencies: currencies
            .into_iter()
            .map(|currency| CurrencyTypeView {
                id: currency.id,
                name: currency.name,
            })
            .collect(),
    }))
}
