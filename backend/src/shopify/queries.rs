//! GraphQL documents sent to the Admin API. The shapes they select are mirrored in [`super::dto`].

pub const RECENT_ORDERS_QUERY: &str = r"
query getRecentOrders($first: Int!) {
  orders(first: $first, sortKey: CREATED_AT, reverse: true) {
    edges {
      node {
        id
        name
        createdAt
        updatedAt
        totalPriceSet { shopMoney { amount currencyCode } }
        displayFinancialStatus
        displayFulfillmentStatus
        customer { id email firstName lastName }
      }
      cursor
    }
    pageInfo { hasNextPage endCursor }
  }
}
";

pub const ORDER_DETAILS_QUERY: &str = r"
query getOrderDetails($id: ID!, $lineItems: Int!) {
  order(id: $id) {
    id
    name
    createdAt
    updatedAt
    totalPriceSet { shopMoney { amount currencyCode } }
    subtotalPriceSet { shopMoney { amount currencyCode } }
    totalTaxSet { shopMoney { amount currencyCode } }
    displayFinancialStatus
    displayFulfillmentStatus
    customer { id email firstName lastName phone }
    lineItems(first: $lineItems) {
      edges {
        node {
          id
          title
          quantity
          variant {
            id
            title
            price
            product { id title featuredImage { url } }
          }
        }
      }
    }
    shippingAddress { firstName lastName address1 address2 city province country zip }
    billingAddress { firstName lastName address1 address2 city province country zip }
  }
}
";
